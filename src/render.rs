//! Server-side HTML for the signed-in app and the auth forms.
//!
//! Every piece of user-supplied text goes through [`escape_html`] before it lands in
//! the markup.

use std::fmt::Write;

use crate::todos::repo_types::Todo;

const HEAD: &str = r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// The `/app` page: caller's email, the add form, and one row per todo (latest first).
pub fn app_page(email: &str, todos: &[Todo]) -> String {
    let mut b = String::with_capacity(2048 + todos.len() * 512);
    b.push_str(HEAD);
    b.push_str(r#"<title>TODO App</title><link rel="stylesheet" href="/static/styles/main.css"></head><body>"#);
    b.push_str(r#"<div class="container"><nav class="nav"><a class="brand" href="/app">Todo</a><div class="spacer"></div><div class="user">"#);
    b.push_str(&escape_html(email));
    b.push_str(r#"</div><form class="inline" action="/logout" method="POST"><button class="btn btn-link" type="submit">Logout</button></form></nav>"#);
    b.push_str(
        r#"<main class="card"><h1>Your Tasks</h1>
   <form class="add-form" action="/todo" method="POST">
     <input name="title" placeholder="Add a new task..." maxlength="100" required>
     <button class="btn btn-primary" type="submit">Add</button>
   </form>
   <ul class="todo-list">"#,
    );

    if todos.is_empty() {
        b.push_str(r#"<li class="empty">No tasks yet. Add your first task!</li>"#);
    }
    for t in todos {
        let (class, label) = if t.done {
            (" completed", "Undo")
        } else {
            ("", "Done")
        };
        // Writing into a String cannot fail.
        let _ = write!(
            b,
            r#"<li class="todo-item{class}"><span class="title">{title}</span>
       <div class="actions">
         <form class="inline" action="/todo/{id}/toggle" method="POST"><button class="btn btn-secondary" type="submit">{label}</button></form>
         <form class="inline" action="/todo/{id}/delete" method="POST"><button class="btn btn-danger" type="submit">Delete</button></form>
       </div></li>"#,
            title = escape_html(&t.title),
            id = t.id,
        );
    }

    b.push_str(r#"</ul></main><footer class="footer">Built with Rust + Postgres</footer></div></body></html>"#);
    b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

/// Login/register form. `notice` comes from the `fail` / `exists` query markers.
pub fn auth_page(form: AuthForm, notice: Option<&str>) -> String {
    let (title, action, button, alt) = match form {
        AuthForm::Login => (
            "Log in",
            "/login",
            "Log in",
            r#"No account yet? <a href="/register">Register</a>"#,
        ),
        AuthForm::Register => (
            "Create account",
            "/register",
            "Register",
            r#"Already registered? <a href="/login">Log in</a>"#,
        ),
    };

    let mut b = String::with_capacity(1536);
    b.push_str(HEAD);
    let _ = write!(
        b,
        r#"<title>{title} · TODO App</title><link rel="stylesheet" href="/static/styles/main.css"></head><body>
<div class="container"><nav class="nav"><a class="brand" href="/">Todo</a></nav>
<main class="card auth"><h1>{title}</h1>"#
    );
    if let Some(msg) = notice {
        let _ = write!(b, r#"<p class="alert">{}</p>"#, escape_html(msg));
    }
    let _ = write!(
        b,
        r#"<form action="{action}" method="POST">
  <label>Email <input type="email" name="email" minlength="5" required autocomplete="email"></label>
  <label>Password <input type="password" name="password" minlength="6" required></label>
  <button class="btn btn-primary" type="submit">{button}</button>
</form>
<p class="muted">{alt}</p></main></div></body></html>"#
    );
    b
}
