//! `tola validate`: run discovery against the content tree and report
//! structural problems (unparseable frontmatter, unreadable paths)
//! without writing any output.

use anyhow::Result;

use crate::core::SiteData;
use crate::utils::plural_count;
use crate::{content, log};

pub fn validate_site(site: &SiteData) -> Result<()> {
    let result = content::discover(&site.content_dir, false)?;
    log!("validate"; "discovered {} across {}",
        plural_count(result.pages.len(), "page"), plural_count(result.sections.len(), "section"));

    if result.errors.is_empty() {
        log!("validate"; "no problems found");
        return Ok(());
    }

    for err in &result.errors {
        log!("validate"; "error: {err}");
    }
    anyhow::bail!("{} found", plural_count(result.errors.len(), "content problem"));
}
