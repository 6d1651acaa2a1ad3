use faststr::FastStr;

pub const DEFAULT_USER_AGENT: &str = concat!("volo-grpc-meta/", env!("CARGO_PKG_VERSION"));

/// The `user-agent` to send: the application's own agent, if any, followed by ours.
pub fn user_agent(custom: Option<&str>) -> FastStr {
    match custom.map(str::trim).filter(|s| !s.is_empty()) {
        Some(custom) => {
            let mut buf = String::with_capacity(custom.len() + 1 + DEFAULT_USER_AGENT.len());
            buf.push_str(custom);
            buf.push(' ');
            buf.push_str(DEFAULT_USER_AGENT);
            FastStr::from_string(buf)
        }
        None => FastStr::from_static_str(DEFAULT_USER_AGENT),
    }
}
