#[cfg(test)]
pub(crate) fn get_tracing_subscriber() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_line_number(true)
        .compact()
        .try_init()
    {
        tracing::debug!("Tracing subscriber already initialized: {}", e);
    }
}
