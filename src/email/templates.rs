fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
{body}
</body>
</html>"#
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<p><a href="{href}" style="display: inline-block; padding: 10px 20px; background: #1d4ed8; color: white; text-decoration: none; border-radius: 4px;">{label}</a></p>"#
    )
}

/// Minimal escaping for values interpolated into HTML text.
pub fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_account_created(name: &str, base_url: &str) -> String {
    let body = format!(
        "<h2>Welcome</h2>\n<p>Hi {},</p>\n<p>An HR portal account has been created for you. Ask your HR administrator for your initial password, then sign in:</p>\n{}",
        escape(name),
        button(&format!("{base_url}/login"), "Sign In"),
    );
    layout("Welcome", &body)
}

pub fn render_password_reset(reset_url: &str) -> String {
    let body = format!(
        "<h2>Password Reset</h2>\n<p>A password reset was requested for your HR portal account.</p>\n{}\n<p style=\"color: #666; font-size: 14px;\">This link expires in 1 hour. If you didn't request this, you can ignore it.</p>",
        button(reset_url, "Reset Password"),
    );
    layout("Password Reset", &body)
}

pub fn render_decision(title: &str, message: &str, link: &str) -> String {
    let body = format!(
        "<h2>{}</h2>\n<p>{}</p>\n{}",
        escape(title),
        escape(message),
        button(link, "Open"),
    );
    layout(&escape(title), &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_escapes_user_text() {
        let html = render_decision("Leave approved", "<script>x</script>", "http://hr/leave");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("http://hr/leave"));
    }
}
