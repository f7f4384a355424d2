// Host platform probes

/// Path FFmpeg can mux a discarded measurement pass into
pub fn null_sink() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}
