//! `TemplateRuntime`: theme-inheritance template resolution plus
//! an "input accessed" event for every template and partial read, fed
//! into a [`ProvenanceCollector`] rather than a thread-local tracker.

pub mod context;
pub mod data;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::Environment;
use parking_lot::Mutex;

use crate::error::RenderError;
use crate::hash::hash_str;
use crate::image_cache::{ImageProcessorCache, Operation};
use crate::provenance::{InputType, ProvenanceCollector};

/// Ordered template search path: active theme directory first, then each
/// parent theme (per `theme.toml extends = "..."`, outermost-last), then
/// the site-local `templates/` directory as a final override point. First
/// match wins.
pub struct TemplateRuntime {
    search_path: Vec<PathBuf>,
    images: Option<(PathBuf, PathBuf)>,
    data_dir: Option<PathBuf>,
}

impl TemplateRuntime {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path, images: None, data_dir: None }
    }

    /// Enable the `resize_image(path, spec)` template function, resolving `path` relative to
    /// `assets_dir` and caching derivatives under `cache_dir`.
    pub fn with_images(mut self, cache_dir: &Path, assets_dir: PathBuf) -> Self {
        self.images = Some((cache_dir.to_path_buf(), assets_dir));
        self
    }

    /// Enable the `data(logical_path)` template function, resolving `logical_path` under `data_dir` as JSON or TOML.
    pub fn with_data(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.search_path.iter().map(|dir| dir.join(name)).find(|p| p.is_file())
    }

    /// Render `name` with `context`, recording every template/partial file
    /// actually read (including those pulled in transitively via
    /// `{% extends %}`/`{% include %}`) into `collector`.
    pub fn render(
        &self,
        name: &str,
        context: minijinja::Value,
        collector: &ProvenanceCollector,
    ) -> Result<String, RenderError> {
        let search_path = self.search_path.clone();
        let accessed = Arc::new(Mutex::new(Vec::new()));
        let accessed_for_loader = accessed.clone();

        let mut env = Environment::new();
        minijinja_contrib::add_to_environment(&mut env);
        env.set_loader(move |tpl_name: &str| {
            let path = search_path.iter().map(|dir| dir.join(tpl_name)).find(|p| p.is_file());
            match path {
                Some(p) => {
                    let source = std::fs::read_to_string(&p).map_err(|e| {
                        minijinja::Error::new(
                            minijinja::ErrorKind::TemplateNotFound,
                            format!("failed to read {}: {e}", p.display()),
                        )
                    })?;
                    accessed_for_loader.lock().push((tpl_name.to_string(), hash_str(&source)));
                    Ok(Some(source))
                }
                None => Ok(None),
            }
        });

        let images_accessed = Arc::new(Mutex::new(Vec::new()));
        if let Some((cache_dir, assets_dir)) = self.images.clone() {
            let images_for_fn = images_accessed.clone();
            env.add_function("resize_image", move |path: String, spec: String| -> Result<minijinja::Value, minijinja::Error> {
                let cache = ImageProcessorCache::new(&cache_dir);
                let source = assets_dir.join(&path);
                let processed = cache.process(&source, Operation::Fill, &spec).map_err(|e| {
                    minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
                })?;
                images_for_fn.lock().push(path);
                Ok(minijinja::context! {
                    url => processed.rel_permalink,
                    width => processed.width,
                    height => processed.height,
                })
            });
        }

        let data_accessed = Arc::new(Mutex::new(Vec::new()));
        if let Some(data_dir) = self.data_dir.clone() {
            let data_for_fn = data_accessed.clone();
            env.add_function("data", move |logical_path: String| -> Result<minijinja::Value, minijinja::Error> {
                let loader = ProvenanceCollector::new();
                let Some(value) = data::load(&data_dir, &logical_path, &loader) else {
                    return Ok(minijinja::Value::UNDEFINED);
                };
                if let Some(record) = loader.finish().inputs.into_iter().next() {
                    data_for_fn.lock().push((logical_path, record.hash));
                }
                Ok(minijinja::Value::from_serialize(serde_json::Value::from(&value)))
            });
        }

        let render_result = env
            .get_template(name)
            .and_then(|tmpl| tmpl.render(context));

        for (path, hash) in accessed.lock().drain(..) {
            collector.record_partial(path, hash);
        }
        for path in images_accessed.lock().drain(..) {
            collector.record(InputType::Asset, path, hash_str("image"));
        }
        for (path, hash) in data_accessed.lock().drain(..) {
            collector.record_data(path, hash);
        }

        render_result.map_err(|source| RenderError::Evaluation {
            page: name.to_string(),
            source,
        })
    }

    pub fn resolved_path(&self, name: &str) -> Option<PathBuf> {
        self.resolve(name)
    }
}
