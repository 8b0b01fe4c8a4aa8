//! Facade tests: the prelude is enough to build, cache and export pages.

use rstest::rstest;
use std::sync::Arc;
use weft::prelude::*;

struct ArticlePage {
	title: &'static str,
}

#[async_trait]
impl PageBuilder for ArticlePage {
	async fn build(&self, runtime: Arc<PageRuntime>) -> Result<Document, BuildError> {
		let mut doc = runtime.create_document(DocumentOptions::default());
		doc.head_mut().title(self.title).meta("description", "An article");
		let heading = doc.create("h1")?.css([("fontSize", "2rem")]).text(self.title);
		doc.push(heading);
		Ok(doc)
	}
}

#[rstest]
#[tokio::test]
async fn test_struct_builder_through_cache() {
	let runtime = PageRuntime::new(RenderSettings::default());

	let html = runtime
		.render_with_cache("article", ArticlePage { title: "Threads & Looms" })
		.await
		.unwrap();

	assert!(html.contains("<title>Threads &amp; Looms</title>"));
	assert!(html.contains("{font-size:2rem;}"));
	assert_eq!(runtime.cache().statistics().entry_count, 1);
}

#[rstest]
#[tokio::test]
async fn test_warmup_reports_serialize() {
	let runtime = PageRuntime::new(RenderSettings::default());

	let reports = runtime
		.warmup(vec![WarmupRoute::new("a", ArticlePage { title: "A" })])
		.await;

	let json = serde_json::to_value(&reports).unwrap();
	assert_eq!(json[0]["key"], "a");
	assert_eq!(json[0]["success"], true);
	assert!(json[0].get("error").is_none());
}

#[rstest]
fn test_cached_document_option() {
	let runtime = PageRuntime::new(RenderSettings::production());
	let mut first = runtime.create_document(DocumentOptions::cached("about"));
	let node = first.create("p").unwrap().text("about");
	first.push(node);
	let html = first.render();

	assert!(html.starts_with("<!DOCTYPE html><html lang=\"en\"><head>"));
	assert_eq!(runtime.cache().get("about"), Some(html));
}
