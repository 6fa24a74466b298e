//! Canonical response strings. Fixed for client stability — clients match
//! on these literally, so they must not be reworded.

pub const UNAUTHORIZED: &str = "Unauthorized. Please name yourself, add \"user_name\" to request body (not empty)and/or enter/check/recheck your Bearer Token in \"Authorization\" header. If you have not have token yet, get it by POST request to endpoint \"get_token\"";
pub const BAD_REQUEST: &str = "BAD REQUEST";
pub const NOT_FOUND: &str = "Not found message/user_name/chat";
pub const METHOD_NOT_ALLOWED: &str = "Not allowed http method";

pub const HAD_TOKEN: &str = "You have already got token .";
pub const MESSAGE_SENT: &str = "Message have sent!";
pub const COMMENT_CREATED: &str = "Comment have created!";
pub const REPORT_SENT: &str = "Report sent success.";
pub const USER_CURRENTLY_BANNED: &str = "User is currently banned.";
pub const YOU_ARE_BANNED: &str = "You are banned!";
pub const CANNOT_REPORT_STRANGER: &str = "You can not report a user you have not chat to.";
