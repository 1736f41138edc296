use crate::server::Result;
use axum::response::{IntoResponse, Response};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

const BUILTIN_TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("post-details.html", include_str!("../../templates/post-details.html")),
    ("posts-list.html", include_str!("../../templates/posts-list.html")),
    ("contacts.html", include_str!("../../templates/contacts.html")),
];

/// An HTML response body.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Html(pub String);

impl IntoResponse for Html {
    fn into_response(self) -> Response {
        (TypedHeader(ContentType::html()), self.0).into_response()
    }
}

impl From<&'static str> for Html {
    fn from(value: &'static str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// The templates compiled into the binary.
    pub fn builtin() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES)?;

        Ok(Self { tera })
    }

    /// Every `*.html` file below `dir`, named by its path relative to `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, tera::Error> {
        let glob = dir.join("**").join("*.html");
        let tera = Tera::new(&glob.to_string_lossy())?;

        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &impl Serialize) -> Result<Html> {
        let context = Context::from_serialize(context)?;
        let body = self.tera.render(template, &context)?;

        Ok(Html(body))
    }
}

#[cfg(test)]
mod tests {
    use crate::server::render::{BUILTIN_TEMPLATES, Templates};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Empty {}

    #[test]
    fn builtin_templates_parse() {
        let templates = Templates::builtin().unwrap();

        for (name, _) in BUILTIN_TEMPLATES {
            assert!(
                templates.tera.get_template_names().any(|loaded| loaded == name),
                "{name} is missing"
            );
        }
    }

    #[test]
    fn contacts_renders_without_context() {
        let templates = Templates::builtin().unwrap();
        let html = templates.render("contacts.html", &Empty {}).unwrap();

        assert!(html.0.contains("<h1>Contacts</h1>"));
        assert!(html.0.contains("href=\"/\""));
    }

    #[test]
    fn missing_template_is_an_error() {
        let templates = Templates::builtin().unwrap();
        assert!(templates.render("nope.html", &Empty {}).is_err());
    }
}
