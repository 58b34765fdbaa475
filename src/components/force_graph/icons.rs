//! Per-category icon images drawn inside the node circles.

use std::collections::HashMap;

use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

/// Icon URL for a category, e.g. `/icons/database.svg`.
pub fn icon_url(base: &str, kind: &str, extension: &str) -> String {
	format!("{}/{}.{}", base.trim_end_matches('/'), kind, extension)
}

/// Lazily loaded icon images keyed by service category.
///
/// Each category first tries the SVG icon and, if that fails to load, the PNG
/// icon. Images that have not finished loading (or failed both) are skipped
/// by the renderer.
pub struct IconCache {
	base: String,
	images: HashMap<String, HtmlImageElement>,
}

impl IconCache {
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			base: base.into(),
			images: HashMap::new(),
		}
	}

	/// Start loading icons for every category not seen before.
	pub fn preload<'a>(&mut self, kinds: impl IntoIterator<Item = &'a str>) {
		for kind in kinds {
			if self.images.contains_key(kind) {
				continue;
			}
			match self.load(kind) {
				Some(img) => {
					self.images.insert(kind.to_string(), img);
				}
				None => debug!("service-graph: could not create image for {}", kind),
			}
		}
	}

	fn load(&self, kind: &str) -> Option<HtmlImageElement> {
		let img = HtmlImageElement::new().ok()?;
		let fallback = icon_url(&self.base, kind, "png");
		let retry = img.clone();
		let on_error = Closure::once_into_js(move || {
			debug!("service-graph: falling back to {}", fallback);
			retry.set_onerror(None);
			retry.set_src(&fallback);
		});
		img.set_onerror(Some(on_error.unchecked_ref()));
		img.set_src(&icon_url(&self.base, kind, "svg"));
		Some(img)
	}

	/// A fully loaded icon for the category, if any.
	pub fn get(&self, kind: &str) -> Option<&HtmlImageElement> {
		self.images
			.get(kind)
			.filter(|img| img.complete() && img.natural_width() > 0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn urls_are_built_from_category() {
		assert_eq!(icon_url("/icons", "database", "svg"), "/icons/database.svg");
		assert_eq!(icon_url("/static/icons/", "api", "png"), "/static/icons/api.png");
	}
}
