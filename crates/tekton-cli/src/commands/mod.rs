pub mod inspect;
pub mod lifecycle;

use std::sync::Arc;

use tekton_reconciler::{ProviderConfig, Reconciler};
use tekton_schema::Kind;
use tekton_storage::ResourceStore;
use tokio::sync::watch;

use crate::cli::OutputFormat;

/// Everything a command needs besides its own arguments.
pub struct Session {
    pub store: Arc<dyn ResourceStore>,
    pub config: ProviderConfig,
    pub cancel: watch::Receiver<bool>,
    pub format: OutputFormat,
}

impl Session {
    pub fn reconciler<R: Kind>(&self) -> Reconciler<R> {
        Reconciler::new(Arc::clone(&self.store), &self.config).with_cancellation(self.cancel.clone())
    }
}

/// Runs `$body` with `$kind` bound to the domain type selected by `$arg`.
#[macro_export]
macro_rules! with_kind {
    ($arg:expr, $kind:ident => $body:expr) => {
        match $arg {
            $crate::cli::KindArg::Task => {
                type $kind = tekton_schema::Task;
                $body
            }
            $crate::cli::KindArg::TaskRun => {
                type $kind = tekton_schema::TaskRun;
                $body
            }
            $crate::cli::KindArg::Pipeline => {
                type $kind = tekton_schema::Pipeline;
                $body
            }
            $crate::cli::KindArg::PipelineRun => {
                type $kind = tekton_schema::PipelineRun;
                $body
            }
        }
    };
}
