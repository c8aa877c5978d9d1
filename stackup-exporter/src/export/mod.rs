//! Output formats: the JSON document and the HTML report.

pub mod html;
pub mod json;
pub mod names;
pub mod palette;

pub use html::{render_html, HtmlRenderer};
pub use json::{from_json, to_json};
