mod cases;

pub use setup::setup;
