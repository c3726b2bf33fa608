//! HTML listing of registered services.

use std::fmt::Write;

use bulletin_core::ServiceEntry;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
	<head>
		<meta charset="UTF-8">
		<title>Services</title>
		<style type="text/css">
			table {
				border-style: solid;
				border-width: 1px;
				border-collapse: collapse;
			}
			td, th {
				border-style: solid;
				border-width: 1px;
				border-color: #BFE0EC;
				padding: 0.2em 0.5em;
			}
			th {
				background-color: #E5F2F7;
				color: #205F8E;
			}
			.status-on {
				color: green;
			}
			.status-off {
				color: red;
			}
		</style>
	</head>
	<body>
	<h3>Services</h3>
	<table>
		<thead>
			<tr>
				<th>Name</th>
				<th>URL</th>
				<th>Status</th>
			</tr>
		</thead>
		<tbody>
"#;

const PAGE_TAIL: &str = r#"		</tbody>
	</table>
	</body>
</html>
"#;

/// Renders the service table, one row per entry in the given order.
pub fn render_service_list(entries: &[ServiceEntry]) -> String {
    let mut html = String::with_capacity(PAGE_HEAD.len() + PAGE_TAIL.len() + entries.len() * 160);
    html.push_str(PAGE_HEAD);

    for entry in entries {
        let name = escape_html(entry.name.as_str());
        let url = escape_html(&entry.url);
        let status = entry.status.label();

        // Writing to a String cannot fail
        let _ = write!(
            html,
            "\t\t\t<tr>\n\
             \t\t\t\t<td>{name}</td>\n\
             \t\t\t\t<td><a href=\"{url}\" target=\"_blank\">{url}</a></td>\n\
             \t\t\t\t<td class=\"status-{status}\">{status}</td>\n\
             \t\t\t</tr>\n"
        );
    }

    html.push_str(PAGE_TAIL);
    html
}

/// Escapes text for use in element content and quoted attributes.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulletin_core::{ServiceName, ServiceStatus};

    fn entry(name: &str, url: &str, status: ServiceStatus) -> ServiceEntry {
        ServiceEntry {
            name: ServiceName::parse(name).unwrap(),
            url: url.to_string(),
            status,
        }
    }

    #[test]
    fn test_empty_listing_has_table() {
        let html = render_service_list(&[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<tbody>"));
        assert!(!html.contains("<td>"));
    }

    #[test]
    fn test_rows_carry_status_class() {
        let html = render_service_list(&[
            entry("api", "http://api.local", ServiceStatus::On),
            entry("db", "http://db.local", ServiceStatus::Off),
        ]);

        assert!(html.contains("<td>api</td>"));
        assert!(html.contains(r#"<a href="http://api.local" target="_blank">http://api.local</a>"#));
        assert!(html.contains(r#"<td class="status-on">on</td>"#));
        assert!(html.contains(r#"<td class="status-off">off</td>"#));
        assert!(html.find("api").unwrap() < html.find("db.local").unwrap());
    }

    #[test]
    fn test_names_and_urls_are_escaped() {
        let html = render_service_list(&[entry(
            "<script>",
            "http://x/?a=1&b=\"2\"",
            ServiceStatus::Off,
        )]);

        assert!(html.contains("<td>&lt;script&gt;</td>"));
        assert!(html.contains("http://x/?a=1&amp;b=&#34;2&#34;"));
        assert!(!html.contains("<script>"));
    }
}
