pub mod config;
pub mod errors;
pub mod handler;
pub mod header_set;
pub mod headers;
pub mod metrics_defs;
mod proxy_service;
pub mod range;
pub mod stats;
pub mod upstream;

#[cfg(test)]
mod testutils;

use errors::ProxyError;
use handler::ProxyHandler;
use proxy_service::ProxyService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use stats::ProxyStats;
use std::sync::Arc;
use upstream::ReqwestUpstream;

pub async fn run(config: config::Config) -> Result<(), ProxyError> {
    config.validate()?;

    let upstream = ReqwestUpstream::try_new(&config.upstream)?;
    let stats = Arc::new(ProxyStats::new());
    let handler = ProxyHandler::new(Arc::new(upstream), stats, config.via_pseudonym);

    let proxy_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        ProxyService::new(handler),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, ProxyError>::new(|| true),
    );

    tokio::try_join!(proxy_task, admin_task)?;
    Ok(())
}
