//! # File Broker
//!
//! Validated entry point for sandbox file operations.
//! Every call is checked by the `PathGuard` first and fails with `InvalidPath`
//! without touching the executor; executor failures become `FileOperationFailed`.

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::domain::error::{Error, Result};
use crate::domain::session::Session;
use crate::domain::traits::FileExecutor;
use crate::domain::types::FileOperationKind;
use crate::infrastructure::tools::executor::LocalExecutor;
use crate::infrastructure::tools::guard::PathGuard;

#[derive(Clone)]
pub struct FileBroker {
    executor: Arc<dyn FileExecutor>,
}

impl Default for FileBroker {
    fn default() -> Self {
        Self::new(Arc::new(LocalExecutor::new()))
    }
}

impl FileBroker {
    pub fn new(executor: Arc<dyn FileExecutor>) -> Self {
        Self { executor }
    }

    fn checked(&self, session: &Session, kind: FileOperationKind, path: &str) -> Result<String> {
        match PathGuard::relative(session, path) {
            Some(relative) => {
                debug!(operation = kind.as_str(), path = %relative, "sandbox operation");
                Ok(relative)
            }
            None => {
                debug!(operation = kind.as_str(), path, "rejected path outside sandbox");
                Err(Error::invalid_path(kind, path))
            }
        }
    }

    pub async fn read(&self, session: &Session, path: &str) -> Result<String> {
        let kind = FileOperationKind::Read;
        let relative = self.checked(session, kind, path)?;
        self.executor
            .read_file(session.sandbox_root_path(), Path::new(&relative))
            .await
            .map_err(|e| Error::file_operation(kind, format!("{e:#}")))
    }

    pub async fn write(&self, session: &Session, path: &str, content: &str) -> Result<()> {
        let kind = FileOperationKind::Write;
        let relative = self.checked(session, kind, path)?;
        self.executor
            .write_file(session.sandbox_root_path(), Path::new(&relative), content)
            .await
            .map_err(|e| Error::file_operation(kind, format!("{e:#}")))
    }

    /// Entry paths relative to the sandbox root; order is whatever the executor yields.
    pub async fn list(&self, session: &Session, path: &str) -> Result<Vec<String>> {
        let kind = FileOperationKind::List;
        let relative = self.checked(session, kind, path)?;
        self.executor
            .list_directory(session.sandbox_root_path(), Path::new(&relative))
            .await
            .map_err(|e| Error::file_operation(kind, format!("{e:#}")))
    }

    pub async fn delete(&self, session: &Session, path: &str) -> Result<()> {
        let kind = FileOperationKind::Delete;
        let relative = self.checked(session, kind, path)?;
        self.executor
            .delete_file(session.sandbox_root_path(), Path::new(&relative))
            .await
            .map_err(|e| Error::file_operation(kind, format!("{e:#}")))
    }

    pub async fn create_directory(&self, session: &Session, path: &str) -> Result<()> {
        let kind = FileOperationKind::CreateDir;
        let relative = self.checked(session, kind, path)?;
        self.executor
            .create_directory(session.sandbox_root_path(), Path::new(&relative))
            .await
            .map_err(|e| Error::file_operation(kind, format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Executor that counts calls and always fails
    #[derive(Default)]
    struct CountingExecutor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FileExecutor for CountingExecutor {
        async fn read_file(&self, _: &Path, _: &Path) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("disk on fire")
        }
        async fn write_file(&self, _: &Path, _: &Path, _: &str) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("disk on fire")
        }
        async fn list_directory(&self, _: &Path, _: &Path) -> anyhow::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("disk on fire")
        }
        async fn delete_file(&self, _: &Path, _: &Path) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("disk on fire")
        }
        async fn create_directory(&self, _: &Path, _: &Path) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("disk on fire")
        }
    }

    fn temp_session() -> (TempDir, Session) {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::new(temp_dir.path().to_string_lossy().to_string());
        (temp_dir, session)
    }

    #[tokio::test]
    async fn test_invalid_path_performs_no_io() {
        let executor = Arc::new(CountingExecutor::default());
        let broker = FileBroker::new(executor.clone());
        let session = Session::new("/work");

        let err = broker.read(&session, "/work/.taskgrid/../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
        assert!(broker.write(&session, "../x", "y").await.is_err());
        assert!(broker.list(&session, "/etc").await.is_err());
        assert!(broker.delete(&session, "a/../../b").await.is_err());
        assert!(broker.create_directory(&Session::unset(), "tasks").await.is_err());

        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_executor_failure_is_wrapped() {
        let broker = FileBroker::new(Arc::new(CountingExecutor::default()));
        let session = Session::new("/work");

        let err = broker.read(&session, "notes.md").await.unwrap_err();
        match err {
            Error::FileOperationFailed { action, message } => {
                assert_eq!(action, "read file");
                assert_eq!(message, "disk on fire");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (_tmp, session) = temp_session();
        let broker = FileBroker::default();
        let full = session.resolve("tasks/plan.md");

        broker.write(&session, &full, "line one\nline two\n").await.unwrap();
        assert_eq!(broker.read(&session, &full).await.unwrap(), "line one\nline two\n");
        assert_eq!(broker.read(&session, "tasks/plan.md").await.unwrap(), "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_list_delete_and_mkdir() {
        let (_tmp, session) = temp_session();
        let broker = FileBroker::default();

        broker.create_directory(&session, "project").await.unwrap();
        broker.write(&session, "project/main.md", "x").await.unwrap();
        assert_eq!(broker.list(&session, "project").await.unwrap(), vec!["project/main.md"]);

        broker.delete(&session, "project/main.md").await.unwrap();
        assert!(broker.list(&session, "project").await.unwrap().is_empty());

        let err = broker.delete(&session, "project/main.md").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to delete file:"));
    }

    #[tokio::test]
    async fn test_io_failure_labelled_once() {
        let (_tmp, session) = temp_session();
        let root = session.sandbox_root_path().to_path_buf();
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("blob.bin"), [0xff, 0xfe, 0xfd]).unwrap();

        let err = FileBroker::default().read(&session, "blob.bin").await.unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Failed to read file: "));
        assert_eq!(text.matches("Failed to read file").count(), 1);
    }
}
