//! Text context assembled for the generative model: the profile block,
//! the wearable metrics block and the prompt/fallback glue around them.

pub mod profile_context;
pub mod wearable_metrics;
pub mod prompt;

pub use profile_context::build_profile_context;
pub use wearable_metrics::{aggregate_samples, render_wearable_summary, summary_bullet_lines};
pub use prompt::{assemble_prompt, fallback_response, resolve_outcome};
