//! Leveled traversal events for callers that want to watch an analysis.
//!
//! The traversal never writes to any output itself; it hands events to a
//! [`TraversalObserver`]. [`TracingObserver`] forwards them to `tracing`,
//! [`SilentObserver`] drops them.

use crate::diff::NodeId;
use crate::finding::FindingKind;
use crate::policy::SuppressReason;
use crate::scope::AnalysisScope;
use tracing::{debug, error, info, trace, warn, Level};

/// Something noteworthy that happened while walking a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalEvent<'a> {
    FindingEmitted {
        scope: &'a AnalysisScope,
        path: &'a str,
        kind: FindingKind,
    },
    DuplicateDiscarded {
        scope: &'a AnalysisScope,
        path: &'a str,
        kind: FindingKind,
    },
    Suppressed {
        scope: &'a AnalysisScope,
        path: &'a str,
        reason: SuppressReason,
    },
    /// The node is already on the walk stack, or was already walked at this path.
    CycleCut {
        scope: &'a AnalysisScope,
        node: NodeId,
        path: &'a str,
    },
    DepthLimitReached {
        scope: &'a AnalysisScope,
        node: NodeId,
        path: &'a str,
        max_depth: usize,
    },
}

impl TraversalEvent<'_> {
    pub fn level(&self) -> Level {
        match self {
            Self::FindingEmitted { .. } => Level::DEBUG,
            Self::DuplicateDiscarded { .. } | Self::CycleCut { .. } => Level::TRACE,
            Self::Suppressed { .. } => Level::DEBUG,
            Self::DepthLimitReached { .. } => Level::WARN,
        }
    }
}

/// Emit a `tracing` event at a level only known at runtime.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::TRACE {
            trace!($($arg)+)
        } else if level == Level::DEBUG {
            debug!($($arg)+)
        } else if level == Level::INFO {
            info!($($arg)+)
        } else if level == Level::WARN {
            warn!($($arg)+)
        } else {
            error!($($arg)+)
        }
    }};
}

/// Receives traversal events. Must be shareable across worker threads.
pub trait TraversalObserver: Send + Sync {
    fn on_event(&self, event: &TraversalEvent<'_>);
}

/// Forwards events to `tracing` at their level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TraversalObserver for TracingObserver {
    fn on_event(&self, event: &TraversalEvent<'_>) {
        let level = event.level();
        match event {
            TraversalEvent::FindingEmitted { scope, path, kind } => {
                event_at!(level, scope = %scope, path = %path, kind = %kind, "Property deprecation finding");
            }
            TraversalEvent::DuplicateDiscarded { scope, path, kind } => {
                event_at!(level, scope = %scope, path = %path, kind = %kind, "Duplicate finding discarded");
            }
            TraversalEvent::Suppressed {
                scope,
                path,
                reason,
            } => {
                event_at!(
                    level,
                    scope = %scope,
                    path = %path,
                    reason = reason.as_str(),
                    "Deprecated property not reported"
                );
            }
            TraversalEvent::CycleCut { scope, node, path } => {
                event_at!(level, scope = %scope, node = %node, path = %path, "Node already on the walk stack or walked at this path");
            }
            TraversalEvent::DepthLimitReached {
                scope,
                node,
                path,
                max_depth,
            } => {
                event_at!(
                    level,
                    scope = %scope,
                    node = %node,
                    path = %path,
                    max_depth = *max_depth,
                    "Traversal depth limit reached, branch skipped"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl TraversalObserver for SilentObserver {
    fn on_event(&self, _event: &TraversalEvent<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_levels() {
        let scope = AnalysisScope::schema("Pet");
        let emitted = TraversalEvent::FindingEmitted {
            scope: &scope,
            path: "age",
            kind: FindingKind::Deprecated,
        };
        assert_eq!(emitted.level(), Level::DEBUG);

        let depth = TraversalEvent::DepthLimitReached {
            scope: &scope,
            node: NodeId(0),
            path: "a.b",
            max_depth: 2,
        };
        assert_eq!(depth.level(), Level::WARN);
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_observer_logs_at_event_level() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let scope = AnalysisScope::schema("Pet");
        tracing::subscriber::with_default(subscriber, || {
            TracingObserver.on_event(&TraversalEvent::CycleCut {
                scope: &scope,
                node: NodeId(1),
                path: "owner",
            });
            TracingObserver.on_event(&TraversalEvent::DepthLimitReached {
                scope: &scope,
                node: NodeId(2),
                path: "a.b",
                max_depth: 2,
            });
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TRACE"));
        assert!(lines[0].contains("walk stack"));
        assert!(lines[1].contains("WARN"));
        assert!(lines[1].contains("max_depth=2"));
    }

    #[test]
    fn test_observers_accept_events() {
        let scope = AnalysisScope::schema("Pet");
        let event = TraversalEvent::CycleCut {
            scope: &scope,
            node: NodeId(1),
            path: "",
        };
        SilentObserver.on_event(&event);
        TracingObserver.on_event(&event);
    }
}
