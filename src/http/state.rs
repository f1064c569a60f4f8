use crate::analytics::{AnalyticsEngine, ReportSelection};
use crate::live::LiveMonitor;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub name: Arc<String>,
    pub engine: Arc<AnalyticsEngine>,
    pub live: Arc<LiveMonitor>,
    pub selection: Arc<ReportSelection>,
}
