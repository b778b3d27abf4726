//! HTML for the mock provider's approval page.

/// Escape HTML special characters to prevent XSS.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate the approval page for a `checkid_setup` request.
pub fn approve_page(submit_path: &str, identity: &str, trust_root: &str, return_to: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Mock OpenID Provider (DEV ONLY)</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, sans-serif;
            max-width: 420px;
            margin: 100px auto;
            padding: 20px;
        }}
        .warning {{
            background: #fff3cd;
            border: 1px solid #ffc107;
            padding: 15px;
            border-radius: 8px;
            margin-bottom: 20px;
        }}
        form {{
            background: #f8f9fa;
            padding: 20px;
            border-radius: 8px;
        }}
        label {{
            display: block;
            margin-bottom: 5px;
            font-weight: 500;
        }}
        input[type="text"], input[type="email"] {{
            width: 100%;
            padding: 10px;
            margin-bottom: 15px;
            border: 1px solid #ced4da;
            border-radius: 4px;
            box-sizing: border-box;
        }}
        button {{
            padding: 12px 20px;
            border: none;
            border-radius: 4px;
            cursor: pointer;
            font-size: 16px;
        }}
    </style>
</head>
<body>
    <div class="warning">
        <h2>Development Only</h2>
        <p>This is a <strong>mock OpenID provider</strong>. Nothing is verified.</p>
    </div>

    <p><strong>{trust_root}</strong> wants to confirm that you own <strong>{identity}</strong>.</p>

    <form action="{submit_path}" method="POST">
        <input type="hidden" name="identity" value="{identity}" />
        <input type="hidden" name="return_to" value="{return_to}" />

        <label for="nickname">Nickname (optional)</label>
        <input type="text" id="nickname" name="nickname" placeholder="dev" />

        <label for="email">Email (optional)</label>
        <input type="email" id="email" name="email" placeholder="dev@example.com" />

        <button type="submit" name="action" value="approve">Approve</button>
        <button type="submit" name="action" value="cancel">Cancel</button>
        <button type="submit" name="action" value="setup_needed">Needs setup</button>
    </form>
</body>
</html>"#,
        submit_path = html_escape(submit_path),
        identity = html_escape(identity),
        trust_root = html_escape(trust_root),
        return_to = html_escape(return_to),
    )
}
