//! Audio output: the `MediaElement` abstraction, its rodio implementation,
//! and the sample tap feeding the visualizer.

mod fetch;
mod rodio_media;
mod tap;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use rodio_media::RodioMedia;
pub use tap::SampleTap;
pub use types::{MediaElement, MediaEvent};

#[cfg(test)]
mod tests;
