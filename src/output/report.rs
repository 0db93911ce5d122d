use super::{marker_text, Report, ReportBody, LOAD_ERROR_MESSAGE, NO_RESULTS_MESSAGE};
use crate::engine::{DisplayMode, Leaderboard, Row, RowMarker};
use crate::utils::{escape_html, format_count};

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

fn row_classes(row: &Row, mode: DisplayMode) -> String {
    let mut classes = vec!["leaderboard-item".to_string()];
    if let RowMarker::Rank {
        position,
        podium: true,
    } = row.marker
    {
        classes.push(format!("rank-{position}"));
    }
    if mode == DisplayMode::Profile {
        classes.push("profile-mode".to_string());
    }
    classes.join(" ")
}

fn render_row(row: &Row, mode: DisplayMode) -> String {
    let assignments = row
        .item
        .assignments
        .iter()
        .map(|a| {
            format!(
                "<li><span>{}</span> <strong>{}</strong></li>",
                escape_html(&a.display_name),
                a.count
            )
        })
        .collect::<Vec<_>>()
        .join("");
    let details_class = if row.expanded { "details open" } else { "details" };
    format!(
        r#"<div class="leaderboard-wrapper">
  <div class="{row_class}">
    <div class="rank">{marker}</div>
    <div class="name">{name}</div>
    <div class="score"><strong>{score}</strong> fields</div>
  </div>
  <div class="{details_class}"><ul>{assignments}</ul></div>
</div>
"#,
        row_class = row_classes(row, mode),
        marker = escape_html(&marker_text(row.marker)),
        name = escape_html(&row.item.name),
        score = format_count(row.item.filtered_score),
    )
}

/// Inner markup of the leaderboard container.
pub fn render_leaderboard_html(leaderboard: &Leaderboard) -> String {
    if leaderboard.is_empty() {
        return format!(r#"<p class="no-results">{NO_RESULTS_MESSAGE}</p>"#);
    }
    leaderboard
        .rows
        .iter()
        .map(|row| render_row(row, leaderboard.mode))
        .collect()
}

pub fn render_html(report: &Report) -> Vec<u8> {
    let json = serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);

    let team_total = report
        .team_total_label()
        .map(|l| escape_html(&l))
        .unwrap_or_default();
    let last_updated = report
        .last_updated_label()
        .map(|l| escape_html(&l))
        .unwrap_or_default();
    let filter_summary = match report.filter.as_ref() {
        Some(f) if !f.search.is_empty() => format!(
            "Types: {} &middot; Search: &ldquo;{}&rdquo;",
            escape_html(&f.types.join(", ")),
            escape_html(&f.search)
        ),
        Some(f) => format!("Types: {}", escape_html(&f.types.join(", "))),
        None => String::new(),
    };
    let body = match &report.body {
        ReportBody::Ready { leaderboard } => render_leaderboard_html(leaderboard),
        ReportBody::LoadFailed { .. } => {
            format!(r#"<p class="no-results">{LOAD_ERROR_MESSAGE}</p>"#)
        }
    };

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Grader Leaderboard</title>
  <link href="https://fonts.googleapis.com/css2?family=Montserrat:wght@700;800&amp;family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <style>
    body {{
      font-family: 'Inter', sans-serif;
      background: #f8fafc;
      color: #0f172a;
      margin: 0;
    }}
    h1 {{
      font-family: 'Montserrat', sans-serif;
      font-weight: 800;
      letter-spacing: -0.025em;
    }}
    main {{ max-width: 860px; margin: 0 auto; padding: 2.5rem 2rem; }}
    .stats {{ display: flex; justify-content: space-between; color: #64748b; font-weight: 600; }}
    .filters {{ color: #64748b; font-size: 0.8rem; margin-bottom: 1.5rem; }}
    .leaderboard-item {{
      display: grid;
      grid-template-columns: 4rem 1fr auto;
      align-items: center;
      padding: 0.9rem 1.2rem;
      margin-top: 0.6rem;
      background: #fff;
      border: 1px solid #e2e8f0;
      border-radius: 0.75rem;
      cursor: pointer;
    }}
    .leaderboard-item.rank-1 {{ border-color: #eab308; background: #fefce8; }}
    .leaderboard-item.rank-2 {{ border-color: #94a3b8; background: #f1f5f9; }}
    .leaderboard-item.rank-3 {{ border-color: #c2410c; background: #fff7ed; }}
    .leaderboard-item.profile-mode {{ border-color: #135bec; }}
    .rank {{ font-family: 'Montserrat', sans-serif; font-weight: 800; }}
    .details {{ display: none; padding: 0.4rem 1.6rem; }}
    .details.open {{ display: block; }}
    .details li {{ display: flex; justify-content: space-between; max-width: 28rem; }}
    .no-results {{ color: #64748b; font-style: italic; text-align: center; padding: 2rem 0; }}
  </style>
</head>
<body>
  <script type="application/json" id="report-data">{json}</script>
  <main>
    <h1>GRADER LEADERBOARD</h1>
    <div class="stats">
      <span id="team-total">{team_total}</span>
      <span id="last-update">{last_updated}</span>
    </div>
    <p class="filters">{filter_summary}</p>
    <div id="leaderboard">
{body}    </div>
  </main>
  <script>
    (function() {{
      for (const row of document.querySelectorAll('#leaderboard .leaderboard-item')) {{
        row.addEventListener('click', function() {{
          const details = row.nextElementSibling;
          if (details) details.classList.toggle('open');
        }});
      }}
    }})();
  </script>
</body>
</html>
"####,
    );

    html.into_bytes()
}
