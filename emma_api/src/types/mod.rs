mod final_scale;
pub use self::final_scale::FinalScaleEntry;

mod issue;
pub use self::issue::IssueSummary;

mod cookie;
pub use self::cookie::SessionCookie;

mod text;
