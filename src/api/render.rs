//! HTML page assembly.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::pagination::NavLink;
use crate::rating::{MAX_RATING, MIN_RATING};
use crate::storage::models::{Category, FileRecord, UserRecord};

/// Labels longer than this are shortened in listings
pub const LABEL_DISPLAY_LEN: usize = 40;
/// Descriptions longer than this are shortened in listings
pub const DESCRIPTION_DISPLAY_LEN: usize = 100;

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shorten to at most `max` characters, marking the cut with "..."
pub fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let kept: String = input.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Format a timestamp in the viewer's zone, falling back to UTC
pub fn local_time(at: DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => at.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string(),
        Err(_) => at.format("%Y-%m-%d %H:%M UTC").to_string(),
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn layout(title: &str, user: Option<&str>, body: &str) -> String {
    let nav = match user {
        Some(username) => format!(
            r#"<a href="/">Home</a> | <a href="/categories">Categories</a> | <a href="/upload">Upload</a> | {} | <a href="/logout">Log out</a>"#,
            escape(username)
        ),
        None => r#"<a href="/login">Log in</a> | <a href="/register">Register</a>"#.to_string(),
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} - filehub</title></head>
<body>
<nav>{nav}</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn message(text: Option<&str>) -> String {
    text.map(|t| format!(r#"<p class="message">{}</p>"#, escape(t)))
        .unwrap_or_default()
}

fn file_rows(files: &[FileRecord]) -> String {
    let mut rows = String::new();
    for file in files {
        let _ = write!(
            rows,
            r#"<tr><td><a href="/download?id={id}">{label}</a></td><td>{description}</td><td>{owner}</td><td>{size}</td><td>{rating}</td></tr>
"#,
            id = file.id,
            label = escape(&truncate(&file.label, LABEL_DISPLAY_LEN)),
            description = escape(&truncate(&file.description, DESCRIPTION_DISPLAY_LEN)),
            owner = escape(&file.owner),
            size = human_size(file.byte_size),
            rating = file.rating,
        );
    }
    format!(
        "<table>\n<tr><th>File</th><th>Description</th><th>Owner</th><th>Size</th><th>Rating</th></tr>\n{rows}</table>"
    )
}

pub fn error_page(title: &str, detail: &str) -> String {
    layout(title, None, &format!("<p>{}</p>", escape(detail)))
}

pub fn login_page(error: Option<&str>, username: &str) -> String {
    let body = format!(
        r#"{message}
<form method="post" action="/login">
<label>Username <input name="username" value="{username}" maxlength="20"></label>
<label>Password <input name="password" type="password"></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
        message = message(error),
        username = escape(username),
    );
    layout("Log in", None, &body)
}

pub fn register_page(error: Option<&str>, username: &str, timezone: &str) -> String {
    let body = format!(
        r#"{message}
<form method="post" action="/register">
<label>Username <input name="username" value="{username}" maxlength="20"></label>
<label>Password <input name="password" type="password"></label>
<label>Confirm password <input name="password_confirm" type="password"></label>
<label>Timezone <input name="timezone" value="{timezone}"></label>
<button type="submit">Register</button>
</form>"#,
        message = message(error),
        username = escape(username),
        timezone = escape(timezone),
    );
    layout("Register", None, &body)
}

pub fn home_page(user: &UserRecord, files: &[FileRecord]) -> String {
    let listing = if files.is_empty() {
        r#"<p>You have not uploaded anything yet. <a href="/upload">Upload a file</a></p>"#
            .to_string()
    } else {
        file_rows(files)
    };
    let body = format!(
        "<p>Rating: {rating}</p>\n<p>Timezone: {timezone}</p>\n<h2>Your files</h2>\n{listing}",
        rating = user.rating,
        timezone = escape(&user.timezone),
    );
    layout(&format!("Welcome, {}", user.username), Some(user.username.as_str()), &body)
}

pub fn upload_page(user: &str, error: Option<&str>) -> String {
    let mut options = String::new();
    for category in Category::ALL {
        let _ = write!(options, r#"<option value="{0}">{0}</option>"#, category);
    }
    let body = format!(
        r#"{message}
<form method="post" action="/upload" enctype="multipart/form-data">
<label>File <input name="file" type="file"></label>
<label>Description <textarea name="description" maxlength="500"></textarea></label>
<label>Category <select name="category">{options}</select></label>
<button type="submit">Upload</button>
</form>"#,
        message = message(error),
    );
    layout("Upload", Some(user), &body)
}

pub struct DownloadView<'a> {
    pub file: &'a FileRecord,
    pub viewer: &'a str,
    pub viewer_timezone: &'a str,
    pub own_vote: Option<i32>,
    pub message: Option<&'a str>,
}

pub fn download_page(view: &DownloadView<'_>) -> String {
    let file = view.file;
    let own_vote = match view.own_vote {
        Some(vote) => format!("<p>Your rating: {vote}</p>"),
        None => "<p>You have not rated this file.</p>".to_string(),
    };
    let body = format!(
        r#"{message}
<p>{description}</p>
<ul>
<li>Owner: {owner}</li>
<li>Category: <a href="/categories/{category}">{category}</a></li>
<li>Uploaded: {uploaded}</li>
<li>Size: {size}</li>
<li>Rating: {rating}</li>
</ul>
<p><a href="/files/{id}">Download</a></p>
{own_vote}
<form method="post" action="/download?id={id}">
<label>Rate ({min} to {max}) <input name="rating" type="number" min="{min}" max="{max}"></label>
<button type="submit">Rate</button>
</form>"#,
        message = message(view.message),
        description = escape(&file.description),
        owner = escape(&file.owner),
        category = file.category,
        uploaded = local_time(file.uploaded_at, view.viewer_timezone),
        size = human_size(file.byte_size),
        rating = file.rating,
        id = file.id,
        min = MIN_RATING,
        max = MAX_RATING,
    );
    layout(&file.label, Some(view.viewer), &body)
}

pub fn categories_page(user: &str, counts: &[(Category, u64)]) -> String {
    let mut items = String::new();
    for (category, count) in counts {
        let _ = writeln!(
            items,
            r#"<li><a href="/categories/{category}">{category}</a> ({count})</li>"#
        );
    }
    layout("Categories", Some(user), &format!("<ul>\n{items}</ul>"))
}

pub struct CategoryView<'a> {
    pub user: &'a str,
    pub category: Category,
    pub files: &'a [FileRecord],
    pub nav: &'a [NavLink],
    pub current_page: u64,
    pub message: Option<&'a str>,
}

pub fn category_page(view: &CategoryView<'_>) -> String {
    let listing = if view.files.is_empty() {
        String::new()
    } else {
        file_rows(view.files)
    };

    let mut nav = String::new();
    for link in view.nav {
        if link.page == view.current_page {
            let _ = write!(nav, "<strong>{}</strong> ", link.page);
        } else {
            let _ = write!(nav, r#"<a href="{}">{}</a> "#, escape(&link.href), link.page);
        }
    }

    let body = format!(
        "{message}\n{listing}\n<nav class=\"pages\">{nav}</nav>",
        message = message(view.message),
    );
    layout(view.category.as_str(), Some(view.user), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("this is far too long", 10), "this is...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_local_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(local_time(at, "Europe/Berlin"), "2024-01-15 13:00 CET");
        assert_eq!(local_time(at, "Not/AZone"), "2024-01-15 12:00 UTC");
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
