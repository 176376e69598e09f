use std::io::IsTerminal;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use bedscan::{AppContext, NativeEngine, ScanEngine, SearchEngine, SearchRequest};
use tokio::task::LocalSet;
use tracing::{info, warn};

use crate::cli::SearchOutput;
use crate::settings::{EngineChoice, ResolvedConfig};
use crate::view::{self, ViewExit};

/// Binds the configured engine and drives one search to completion.
pub(crate) struct SearchWorkflow {
    engine: Rc<dyn SearchEngine>,
    request: SearchRequest,
    title: String,
    live_view: bool,
}

impl SearchWorkflow {
    pub(crate) fn from_config(config: ResolvedConfig) -> Result<Self> {
        let engine: Rc<dyn SearchEngine> = match &config.engine {
            EngineChoice::Scan(tuning) => Rc::new(ScanEngine::with_tuning(*tuning)),
            EngineChoice::Native(path) => {
                let engine = NativeEngine::load(path)
                    .with_context(|| format!("failed to bind engine {}", path.display()))?;
                info!(library = %engine.path().display(), "engine library bound");
                Rc::new(engine)
            }
        };

        Ok(Self {
            engine,
            request: config.request,
            title: format!("seed {} ({})", config.seed_text, config.request.floor),
            live_view: live_view_enabled(config.view),
        })
    }

    pub(crate) fn run(self) -> Result<SearchOutput> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to start the async runtime")?;
        let local = LocalSet::new();
        local.block_on(&runtime, self.drive())
    }

    async fn drive(self) -> Result<SearchOutput> {
        let context = AppContext::new(Rc::clone(&self.engine));
        let id = context.submit(self.request);

        if self.live_view {
            let exit = view::run(&context, &self.title).await?;
            if exit == ViewExit::Interrupted {
                // Dropping the local set afterwards cancels the session and
                // releases its engine handle.
                warn!(%id, "search interrupted; printing partial results");
                return Ok(SearchOutput {
                    request: self.request,
                    status: context.status(),
                    results: context.results().snapshot(),
                });
            }
        }

        let report = context.finish().await;
        if report.completed() == 0 {
            if let Some(Err(err)) = report.sessions.into_iter().next() {
                return Err(err).context("search failed");
            }
            bail!("search did not complete");
        }

        info!(results = report.results.len(), status = %report.status, "search finished");
        Ok(SearchOutput {
            request: self.request,
            status: report.status,
            results: report.results,
        })
    }
}

/// Whether the live view should be shown; an explicit setting wins over
/// terminal detection.
pub(crate) fn live_view_enabled(setting: Option<bool>) -> bool {
    setting.unwrap_or_else(|| std::io::stdout().is_terminal() && std::io::stderr().is_terminal())
}

#[cfg(test)]
mod tests {
    use bedscan::{Coordinate, Floor, ScanTuning, SearchStatus};

    use super::*;

    fn workflow(density: f64, range: i32) -> SearchWorkflow {
        let config = ResolvedConfig {
            seed_text: "3".into(),
            request: SearchRequest::symmetric(3, Floor::Overworld, range, -60).unwrap(),
            range,
            engine: EngineChoice::Scan(ScanTuning {
                columns_per_step: 4,
                density,
            }),
            format: crate::cli::OutputFormat::Plain,
            view: Some(false),
        };
        SearchWorkflow::from_config(config).expect("workflow")
    }

    #[test]
    fn headless_run_returns_ranked_results() {
        let output = workflow(1.0, 2).run().expect("search runs");

        assert_eq!(output.status, SearchStatus::Done);
        assert_eq!(output.results.len(), 25);
        assert_eq!(output.results[0], Coordinate::new(0, -60, 0));
        assert_eq!(output.results[1], Coordinate::new(-1, -60, 0));
    }

    #[test]
    fn explicit_view_setting_wins() {
        assert!(!live_view_enabled(Some(false)));
        assert!(live_view_enabled(Some(true)));
    }

    #[test]
    fn missing_native_library_fails_to_bind() {
        let config = ResolvedConfig {
            seed_text: "1".into(),
            request: SearchRequest::symmetric(1, Floor::Overworld, 1, -60).unwrap(),
            range: 1,
            engine: EngineChoice::Native("/nonexistent/bedrock-engine.so".into()),
            format: crate::cli::OutputFormat::Plain,
            view: Some(false),
        };
        let err = SearchWorkflow::from_config(config).err().expect("should fail");
        assert!(err.to_string().contains("failed to bind engine"));
    }
}
