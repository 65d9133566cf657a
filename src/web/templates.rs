//! Template rendering with Tera

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Create a new template renderer with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("search.html", include_str!("../templates/search.html")),
            (
                "components/result.html",
                include_str!("../templates/components/result.html"),
            ),
            (
                "components/facet.html",
                include_str!("../templates/components/facet.html"),
            ),
            (
                "components/paging.html",
                include_str!("../templates/components/paging.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &impl Serialize) -> Result<String> {
        let ctx = Context::from_serialize(context)?;
        Ok(self.tera.render(template, &ctx)?)
    }
}
