//! HTML for the upload form and the result page. Every interpolated value goes through
//! `escape_html`.

use axum::response::Html;

use crate::models::job::Job;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#222}\
form label{display:block;margin-top:1rem;font-weight:600}\
input[type=text]{width:100%;padding:.4rem}\
button{margin-top:1.5rem;padding:.5rem 1.5rem}\
.error{color:#b00020;font-weight:600}\
.job{border:1px solid #ddd;border-radius:6px;padding:1rem;margin:1rem 0}\
.rating{font-weight:600}\
pre{white-space:pre-wrap;background:#f6f6f6;padding:1rem}";

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    ))
}

/// The upload form, with an inline error when the last submission was rejected.
pub fn index(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>\n", escape_html(e)))
        .unwrap_or_default();

    layout(
        "Career Search",
        &format!(
            "<h1>Career Search</h1>\n{error}\
             <form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
             <label for=\"file\">Resume (.pdf or .docx)</label>\n\
             <input type=\"file\" id=\"file\" name=\"file\" accept=\".pdf,.docx\">\n\
             <label for=\"keywords\">Keywords</label>\n\
             <input type=\"text\" id=\"keywords\" name=\"keywords\" \
             placeholder=\"Software Engineer, Python, Azure, Remote\">\n\
             <label for=\"location\">Location</label>\n\
             <input type=\"text\" id=\"location\" name=\"location\" placeholder=\"US\">\n\
             <button type=\"submit\">Search</button>\n\
             </form>"
        ),
    )
}

pub fn result(keywords: &str, location: &str, text: &str, jobs: &[Job]) -> Html<String> {
    let jobs_html = if jobs.is_empty() {
        "<p>No jobs found.</p>".to_string()
    } else {
        jobs.iter().map(job_card).collect::<Vec<_>>().join("\n")
    };

    layout(
        "Career Search Results",
        &format!(
            "<h1>Results</h1>\n\
             <p><strong>Keywords:</strong> {keywords} &middot; <strong>Location:</strong> {location}</p>\n\
             <h2>Jobs ({count})</h2>\n{jobs_html}\n\
             <h2>Resume</h2>\n<pre>{text}</pre>\n\
             <p><a href=\"/\">New search</a></p>",
            keywords = escape_html(keywords),
            location = escape_html(location),
            count = jobs.len(),
            text = escape_html(text),
        ),
    )
}

fn job_card(job: &Job) -> String {
    let field = |v: &Option<String>| escape_html(v.as_deref().unwrap_or(""));
    let rating = |v: Option<i64>, max: u8| {
        v.map(|r| format!("{r}/{max}"))
            .unwrap_or_else(|| "n/a".to_string())
    };
    let title = match job.url.as_deref() {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => format!(
            "<a href=\"{}\">{}</a>",
            escape_html(url),
            field(&job.title)
        ),
        _ => field(&job.title),
    };

    format!(
        "<div class=\"job\">\n<h3>{title}</h3>\n\
         <p>{company} &middot; {location} &middot; {provider}</p>\n\
         <p>{description}</p>\n\
         <p class=\"rating\">Fit: {rating}</p>\n<p>{rating_notes}</p>\n\
         <p class=\"rating\">Company: {company_rating}</p>\n<p>{company_notes}</p>\n</div>",
        company = field(&job.company),
        location = field(&job.location),
        provider = field(&job.provider),
        description = field(&job.description),
        rating = rating(job.rating, 10),
        rating_notes = field(&job.rating_notes),
        company_rating = rating(job.company_rating, 5),
        company_notes = field(&job.company_notes),
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_index_shows_escaped_error() {
        let Html(page) = index(Some("Keywords are <required>"));
        assert!(page.contains("<p class=\"error\">Keywords are &lt;required&gt;</p>"));
        assert!(page.contains("name=\"location\""));
        assert!(!index(None).0.contains("class=\"error\""));
    }

    #[test]
    fn test_result_renders_jobs() {
        let jobs = vec![Job {
            title: Some("Software Engineer".to_string()),
            company: Some("Acme".to_string()),
            url: Some("javascript:alert(1)".to_string()),
            rating: Some(8),
            ..Job::default()
        }];
        let Html(page) = result("Python", "US", "Jane <Doe>", &jobs);
        assert!(page.contains("Jobs (1)"));
        assert!(page.contains("<h3>Software Engineer</h3>"));
        assert!(page.contains("Fit: 8/10"));
        assert!(page.contains("Company: n/a"));
        assert!(page.contains("Jane &lt;Doe&gt;"));
        assert!(!page.contains("javascript:"));
    }

    #[test]
    fn test_result_without_jobs() {
        let Html(page) = result("", "", "", &[]);
        assert!(page.contains("No jobs found."));
    }
}
