//! Server-rendered admin dashboard.
//!
//! Reads straight from the record store on every load; the page scripts call
//! the JSON endpoints for login, logout and user management and then reload.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};

use atelier_types::models::{AdminUser, ContactSubmission, WorkshopEnrollment};

use crate::auth::AppState;
use crate::error::{ApiError, run_db};

const LOGIN_PATH: &str = "/admin/login";
const DASHBOARD_PATH: &str = "/admin";

struct DashboardData {
    enrollments: Vec<WorkshopEnrollment>,
    submissions: Vec<ContactSubmission>,
    users: Vec<AdminUser>,
}

/// GET /admin
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    if !state.is_authenticated(&jar) {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    }

    let data = run_db(&state, "Failed to fetch data", |db| {
        Ok(DashboardData {
            enrollments: db.list_enrollments()?,
            submissions: db.list_contact_submissions()?,
            users: db.list_admin_users()?,
        })
    })
    .await?;

    Ok(Html(render_dashboard(&data, &state.base_url)).into_response())
}

/// GET /admin/login
pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if state.is_authenticated(&jar) {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    Html(LOGIN_PAGE).into_response()
}

// -- Formatting --

/// `Jan 5, 2025, 03:04 PM`, in UTC.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y, %I:%M %p").to_string()
}

pub fn format_last_login(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(format_timestamp).unwrap_or_else(|| "Never".to_string())
}

fn or_dash(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_else(|| "-".to_string())
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// -- Rendering --

fn render_dashboard(data: &DashboardData, base_url: &str) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str(PAGE_HEAD);

    html.push_str(&format!(
        r#"<header>
<h1>Admin Dashboard</h1>
<nav><a href="{home}/en">&larr; Back to Website</a> <button id="logout">Log out</button></nav>
</header>
<section class="stats">
<div><p>Workshop Enrollments</p><strong>{enrollments}</strong></div>
<div><p>Contact Submissions</p><strong>{submissions}</strong></div>
</section>
"#,
        home = escape(base_url.trim_end_matches('/')),
        enrollments = data.enrollments.len(),
        submissions = data.submissions.len(),
    ));

    render_enrollments(&mut html, &data.enrollments);
    render_submissions(&mut html, &data.submissions);
    render_users(&mut html, &data.users);

    html.push_str(DASHBOARD_SCRIPT);
    html.push_str("</body></html>\n");
    html
}

fn render_enrollments(html: &mut String, rows: &[WorkshopEnrollment]) {
    html.push_str(&format!("<h2>Workshop Enrollments ({})</h2>\n", rows.len()));
    if rows.is_empty() {
        html.push_str("<p class=\"empty\">No workshop enrollments yet.</p>\n");
        return;
    }

    html.push_str(
        "<table><thead><tr><th>Date</th><th>Name</th><th>Email</th><th>Phone</th>\
         <th>Workshop</th><th>Preferred Date</th><th>Message</th><th>Language</th></tr></thead><tbody>\n",
    );
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            format_timestamp(&row.created_at),
            escape(&row.name),
            escape(&row.email),
            or_dash(row.phone.as_deref()),
            escape(&row.workshop),
            or_dash(row.preferred_date.as_deref()),
            or_dash(row.message.as_deref()),
            row.locale.as_str().to_uppercase(),
        ));
    }
    html.push_str("</tbody></table>\n");
}

fn render_submissions(html: &mut String, rows: &[ContactSubmission]) {
    html.push_str(&format!("<h2>Contact Submissions ({})</h2>\n", rows.len()));
    if rows.is_empty() {
        html.push_str("<p class=\"empty\">No contact submissions yet.</p>\n");
        return;
    }

    html.push_str(
        "<table><thead><tr><th>Date</th><th>Name</th><th>Email</th><th>Subject</th>\
         <th>Message</th><th>Language</th></tr></thead><tbody>\n",
    );
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            format_timestamp(&row.created_at),
            escape(&row.name),
            escape(&row.email),
            escape(&row.subject),
            escape(&row.message),
            row.locale.as_str().to_uppercase(),
        ));
    }
    html.push_str("</tbody></table>\n");
}

fn render_users(html: &mut String, users: &[AdminUser]) {
    html.push_str(
        r#"<h2>User Management</h2>
<form id="add-user">
<input name="username" placeholder="Username" required>
<input name="email" type="email" placeholder="Email" required>
<select name="role"><option value="admin">Admin</option><option value="editor">Editor</option><option value="viewer">Viewer</option></select>
<button type="submit">Add User</button>
<span id="user-error" class="error"></span>
</form>
"#,
    );

    if users.is_empty() {
        html.push_str("<p class=\"empty\">No users yet.</p>\n");
        return;
    }

    html.push_str(
        "<table><thead><tr><th>Username</th><th>Email</th><th>Role</th><th>Created</th>\
         <th>Last Login</th><th></th></tr></thead><tbody>\n",
    );
    for user in users {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><button class=\"delete-user\" data-id=\"{}\">Delete</button></td></tr>\n",
            escape(&user.username),
            escape(&user.email),
            escape(&user.role),
            format_timestamp(&user.created_at),
            format_last_login(user.last_login.as_ref()),
            user.id,
        ));
    }
    html.push_str("</tbody></table>\n");
}

const PAGE_HEAD: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8">
<meta name="robots" content="noindex">
<title>Admin Dashboard</title>
<style>
body{font-family:system-ui,sans-serif;background:#f5efe6;color:#333;margin:2rem}
table{width:100%;border-collapse:collapse;background:#fff;margin-bottom:2rem}
th,td{padding:.5rem .75rem;border-bottom:1px solid #e5e5e5;text-align:left;font-size:.9rem}
th{background:#fafafa;text-transform:uppercase;font-size:.75rem;color:#666}
.stats{display:flex;gap:1rem;margin-bottom:2rem}
.stats div{background:#fff;padding:1rem;flex:1;border-radius:.5rem}
.stats strong{font-size:2rem;color:#c0633f}
.empty{color:#888}.error{color:#b00020}
</style></head><body>
"#;

const DASHBOARD_SCRIPT: &str = r#"<script>
document.getElementById('logout').addEventListener('click', async () => {
  await fetch('/admin/auth/logout', { method: 'POST' });
  location.href = '/admin/login';
});
document.getElementById('add-user').addEventListener('submit', async (e) => {
  e.preventDefault();
  const form = new FormData(e.target);
  const res = await fetch('/admin/users', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(Object.fromEntries(form)),
  });
  if (res.ok) { location.reload(); return; }
  const body = await res.json().catch(() => ({}));
  document.getElementById('user-error').textContent = body.error || 'Failed to add user';
});
document.querySelectorAll('.delete-user').forEach((btn) => {
  btn.addEventListener('click', async () => {
    if (!confirm('Are you sure you want to delete this user?')) return;
    const res = await fetch('/admin/users?id=' + btn.dataset.id, { method: 'DELETE' });
    if (res.ok) location.reload();
  });
});
</script>
"#;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8">
<meta name="robots" content="noindex">
<title>Admin Login</title>
<style>
body{font-family:system-ui,sans-serif;background:#f5efe6;display:flex;justify-content:center;padding-top:10vh}
form{background:#fff;padding:2rem;border-radius:.75rem;display:flex;flex-direction:column;gap:1rem;min-width:18rem}
.error{color:#b00020}
</style></head><body>
<form id="login">
<h1>Admin Login</h1>
<input name="password" type="password" placeholder="Password" required autofocus>
<button type="submit">Log in</button>
<span id="login-error" class="error"></span>
</form>
<script>
document.getElementById('login').addEventListener('submit', async (e) => {
  e.preventDefault();
  const password = new FormData(e.target).get('password');
  const res = await fetch('/admin/auth/login', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ password }),
  });
  if (res.ok) { location.href = '/admin'; return; }
  const body = await res.json().catch(() => ({}));
  document.getElementById('login-error').textContent = body.error || 'Login failed';
});
</script>
</body></html>
"#;
