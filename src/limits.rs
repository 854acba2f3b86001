/// Longest stay a single reservation may cover, in nights.
pub const MAX_STAY_NIGHTS: i64 = 365;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_TITLE_LEN: usize = 512;
pub const MAX_PROPERTIES: usize = 10_000;
pub const MAX_RESERVATIONS_PER_PROPERTY: usize = 5_000;

/// Widest window `day_hints` will render.
pub const MAX_HINT_WINDOW_DAYS: i64 = 366;

/// Image reference used when a listing arrives without any.
pub const PLACEHOLDER_IMAGE: &str = "placeholder.png";
