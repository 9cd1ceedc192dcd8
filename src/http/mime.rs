/// Maps a file extension to the Content-Type the server declares for it.
///
/// Unknown extensions are served as an opaque octet stream, which is also what
/// the client's streaming branch assumes for anything outside its text-like
/// allow-list.
pub fn content_type(extension: &str) -> &'static str {
    match extension {
        "htm" | "html" => "text/html",
        "txt" | "dat" => "text/plain",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
