//! Floating card describing the hovered label line.

use leptos::prelude::*;

use super::state::HoverDetail;

/// Offset of the card from the pointer, in pixels.
const CARD_OFFSET: f64 = 14.0;

/// Absolutely positioned card next to the pointer. Renders nothing while
/// `detail` is `None`.
#[component]
pub fn HoverCard(#[prop(into)] detail: Signal<Option<HoverDetail>>) -> impl IntoView {
	move || {
		detail.get().map(|d| {
			let style = format!(
				"position: absolute; left: {}px; top: {}px; pointer-events: none;",
				d.x + CARD_OFFSET,
				d.y + CARD_OFFSET
			);
			let class = format!("hover-card hover-card-{}", d.kind);
			view! {
				<div class=class style=style>
					<div class="hover-card-kind">{format!("{} detail", d.kind)}</div>
					<div class="hover-card-service">{d.service}</div>
					<div class="hover-card-text">{d.text}</div>
				</div>
			}
		})
	}
}
