use askama::Template;
use askama_web::WebTemplate;

use crate::constants::EXAMPLE_TOPICS;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) topics: Vec<&'static str>,
}

/// handles the / GET
pub(crate) async fn index_handler() -> IndexTemplate {
    IndexTemplate {
        topics: EXAMPLE_TOPICS.to_vec(),
    }
}
