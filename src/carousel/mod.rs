mod controller;
mod deadline;
mod geometry;

pub use self::{
    controller::{CarouselConfig, CarouselController, Command, Direction, Phase},
    deadline::Deadline,
    geometry::{
        Layout, index_for_offset, index_for_progress, offset_for_index, progress,
        progress_for_offset, scroll_per_slide,
    },
};
