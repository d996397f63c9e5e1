//! `rss.xml` generation via the `rss` crate. Only
//! pages carrying both a title and a parseable date are eligible; pages
//! missing either are silently excluded rather than erroring the build,
//! matching the "log-continue" failure policy for P13.

use rss::{validation::Validate, ChannelBuilder, GuidBuilder, ItemBuilder};

use crate::atomic_io;
use crate::config::SiteConfig;
use crate::core::Page;
use crate::utils::date::DateTimeUtc;
use std::path::Path;

pub fn write_feed(pages: &[&Page], config: &SiteConfig, output_dir: &Path) -> std::io::Result<()> {
    let base_url = config.site.baseurl.trim_end_matches('/');
    let items: Vec<rss::Item> = pages
        .iter()
        .filter(|p| !p.is_draft() && !p.is_virtual())
        .filter_map(|p| page_to_item(p, base_url))
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.site.title)
        .link(config.site.baseurl.clone())
        .description(&config.site.description)
        .language(Some(config.site.language.clone()))
        .generator("tola".to_string())
        .items(items)
        .build();

    if channel.validate().is_err() {
        return Ok(()); // log-continue: malformed feed is skipped, not fatal
    }

    atomic_io::write_text(&output_dir.join("rss.xml"), &channel.to_string())
}

fn page_to_item(page: &Page, base_url: &str) -> Option<rss::Item> {
    let date = page.meta.date.as_ref()?;
    let pub_date = DateTimeUtc::parse(date).map(DateTimeUtc::to_rfc2822)?;
    let path = page.permalink.as_ref()?.as_str();
    let link = format!("{base_url}{path}");

    Some(
        ItemBuilder::default()
            .title(page.meta.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(page.meta.summary.clone())
            .pub_date(pub_date)
            .author(page.meta.author.clone())
            .build(),
    )
}
