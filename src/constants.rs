pub mod graph {
    pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
    pub const DEFAULT_API_VERSION: &str = "v21.0";
    pub const ACCOUNT_PREFIX: &str = "act_";
}

pub mod gemini {
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
    pub const DEFAULT_MIME_TYPE: &str = "image/png";
}

pub mod hosting {
    pub const IMGBB_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";
    pub const CATBOX_UPLOAD_URL: &str = "https://catbox.moe/user/api.php";
    pub const NULL_POINTER_UPLOAD_URL: &str = "https://0x0.st";
    pub const DEFAULT_PROVIDERS: &[&str] = &["imgbb", "catbox"];
    pub const DATA_URL_MAX_BYTES: usize = 5 * 1024 * 1024;
    pub const DOWNLOAD_MAX_BYTES: usize = 30 * 1024 * 1024;
}

pub mod network {
    pub const TIMEOUT_HTTP_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_IMAGE_GENERATION_MS: u64 = 120_000;
}

pub mod retry {
    pub const MAX_ATTEMPTS: usize = 3;
    pub const BASE_DELAY_MS: u64 = 250;
    pub const MAX_DELAY_MS: u64 = 5_000;
    pub const JITTER: f64 = 0.2;
    pub const STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];
}

pub mod limits {
    pub const DEFAULT_LIST_LIMIT: usize = 25;
    pub const MAX_LIST_LIMIT: usize = 500;
    pub const MAX_PAGES: usize = 20;
}

pub mod statuses {
    pub const OBJECT_STATUSES: &[&str] = &["ACTIVE", "PAUSED", "ARCHIVED", "DELETED"];
}
