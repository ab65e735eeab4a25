mod settings;

pub use settings::{Settings, GESTAO_CLICK_SOURCE};
