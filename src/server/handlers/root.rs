pub async fn home() -> &'static str {
    "POS Webhooks"
}
