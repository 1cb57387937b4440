//! HTML pages: landing, registration and the access-key challenge.

/// Escape text for an HTML element or attribute.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Encode text as a JavaScript string literal safe inside `<script>`.
fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; max-width: 600px; margin: 40px auto; padding: 20px; }
.form-group { margin-bottom: 15px; }
label { display: block; margin-bottom: 5px; }
input[type="text"], input[type="password"] { width: 100%; padding: 8px; border: 1px solid #ddd; border-radius: 4px; box-sizing: border-box; }
button { padding: 10px 20px; background: #007bff; color: white; border: none; cursor: pointer; border-radius: 4px; }
button:hover { background: #0056b3; }
.message { display: none; padding: 10px; border-radius: 4px; margin-bottom: 15px; }
.error { color: #dc3545; background: #f8d7da; }
.success { color: #155724; background: #d4edda; }
"#;

const SHOW_MESSAGE: &str = r#"
function showMessage(text, ok) {
    const el = document.getElementById('message');
    el.className = 'message ' + (ok ? 'success' : 'error');
    el.style.display = 'block';
    el.textContent = text;
}
"#;

/// Landing page: enter a channel id and jump to it.
pub fn index_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Channel Redirect</title>
    <style>{STYLE}</style>
</head>
<body>
    <h1>Channel Redirect</h1>
    <p>Reach a service on a changing address through a fixed channel id.</p>
    <div class="form-group">
        <input type="text" id="channel" placeholder="Channel id">
    </div>
    <button onclick="go()">Go</button>
    <p><a href="/register">Register or update a channel</a></p>
    <script>
    function go() {{
        const id = document.getElementById('channel').value.trim();
        if (id) {{
            window.location.href = '/' + encodeURIComponent(id);
        }}
    }}
    document.getElementById('channel').addEventListener('keydown', function (event) {{
        if (event.key === 'Enter') {{ go(); }}
    }});
    </script>
</body>
</html>"#
    )
}

/// Registration form. Submits to `/api/create` or `/api/update`.
pub fn register_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Channel Redirect - Register</title>
    <style>{STYLE}</style>
</head>
<body>
    <h1>Register a channel</h1>
    <div id="message" class="message"></div>
    <div class="form-group">
        <label>Channel id</label>
        <input type="text" id="channel_id" placeholder="Channel id">
    </div>
    <div class="form-group">
        <label>Password</label>
        <input type="password" id="password" placeholder="Required to update the channel later">
    </div>
    <div class="form-group">
        <label>Host</label>
        <input type="text" id="host" value="127.0.0.1">
    </div>
    <div class="form-group">
        <label>Port</label>
        <input type="text" id="port" value="5666">
    </div>
    <div class="form-group">
        <label>Access password (optional)</label>
        <input type="password" id="accessKey" placeholder="Leave empty for public access">
    </div>
    <div class="form-group">
        <label><input type="checkbox" id="https"> Use HTTPS</label>
    </div>
    <button onclick="submitChannel('/api/create')">Register</button>
    <button onclick="submitChannel('/api/update')">Update</button>
    <script>
    {SHOW_MESSAGE}
    async function submitChannel(endpoint) {{
        const data = {{
            channel_id: document.getElementById('channel_id').value.trim(),
            password: document.getElementById('password').value,
            host: document.getElementById('host').value.trim(),
            port: document.getElementById('port').value.trim(),
            https: document.getElementById('https').checked,
            accessKey: document.getElementById('accessKey').value.trim()
        }};
        try {{
            const response = await fetch(endpoint, {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify(data)
            }});
            showMessage(await response.text(), response.ok);
        }} catch (e) {{
            showMessage('Request failed, please try again', false);
        }}
    }}
    </script>
</body>
</html>"#
    )
}

/// Access-key prompt for a gated channel. Reloads the page once the proof
/// cookie has been set.
pub fn challenge_page(channel_id: &str) -> String {
    let title = escape_html(channel_id);
    let channel = js_string(channel_id);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Access check - {title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <h2>Access check for {title}</h2>
    <div id="message" class="message"></div>
    <div class="form-group">
        <label>Access password</label>
        <input type="password" id="accessKey" placeholder="Access password">
    </div>
    <button onclick="verify()">Verify</button>
    <script>
    {SHOW_MESSAGE}
    async function verify() {{
        const accessKey = document.getElementById('accessKey').value.trim();
        if (!accessKey) {{
            showMessage('Please enter the access password', false);
            return;
        }}
        try {{
            const response = await fetch('/api/verify', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ channel_id: {channel}, accessKey: accessKey }})
            }});
            if (response.status === 200) {{
                window.location.reload();
            }} else {{
                showMessage(await response.text(), false);
            }}
        }} catch (e) {{
            showMessage('Verification failed, please try again', false);
        }}
    }}
    document.getElementById('accessKey').addEventListener('keydown', function (event) {{
        if (event.key === 'Enter') {{ verify(); }}
    }});
    </script>
</body>
</html>"#
    )
}
