//! `tola serve`: explicitly out of core scope. This stub builds the
//! site once and tells the user where the output landed rather than
//! standing up an HTTP server or watch loop.

use anyhow::Result;

use crate::core::SiteData;
use crate::{log, orchestrator};

pub fn serve_once(site: &SiteData, port: u16) -> Result<()> {
    let report = orchestrator::run_build(site, false)?;
    log!("serve"; "built {} page(s), {} cached, {} asset(s)", report.pages_rendered, report.pages_cache_hit, report.assets_processed);
    log!("serve"; "serving is out of scope for this core; point a static file server at {} (e.g. `python3 -m http.server {port} -d {}`)",
        site.output_dir.display(), site.output_dir.display());
    Ok(())
}
