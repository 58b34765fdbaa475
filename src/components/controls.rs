//! Layout controls shown above the graph.

use leptos::prelude::*;

use crate::config::RepulsionRange;

/// Range input bound to the repulsion strength.
///
/// The signal is only written when the input commits (`change`), so dragging
/// the thumb produces a single update when released.
#[component]
pub fn RepulsionSlider(value: RwSignal<f64>, range: RepulsionRange) -> impl IntoView {
	let (min, max, step) = (
		range.min.to_string(),
		range.max.to_string(),
		range.step.to_string(),
	);
	let on_change = move |ev: leptos::ev::Event| {
		let next = range.parse(&event_target_value(&ev));
		if next != value.get_untracked() {
			value.set(next);
		}
	};

	view! {
		<label class="repulsion-slider">
			<span>"Repulsion: " {move || value.get().to_string()}</span>
			<input
				type="range"
				min=min
				max=max
				step=step
				prop:value=move || value.get().to_string()
				on:change=on_change
			/>
		</label>
	}
}
