//! HTML rendering. Every value that did not come from a constant goes through [`escape`].

use chrono::{DateTime, Utc};
use modelserve_core::purchase::format_percentage;
use modelserve_core::{Deployment, Gender, IrisSpecies, PurchaseOutcome, SpeciesDisplay};

use crate::form::{AGE_CONTROL, Control, FormValues, IRIS_CONTROLS, SALARY_CONTROL};
use crate::state::{Outcome, Phase};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem;
       background: #1b1838; color: #e4e4f0; }
h1 { text-align: center; }
.status-ok { color: #4ECDC4; font-weight: 600; }
.status-ko { color: #FF6B6B; font-weight: 600; }
.checked { color: #888; font-size: 0.8rem; }
form { display: grid; gap: 0.8rem; margin: 1.5rem 0; }
label { display: grid; gap: 0.2rem; }
button { padding: 0.6rem; font-size: 1rem; }
button[disabled] { opacity: 0.4; cursor: not-allowed; }
.card { background: rgba(255,255,255,0.07); border-radius: 16px; padding: 1.2rem;
        text-align: center; border: 1px solid rgba(255,255,255,0.12); }
.icon { font-size: 3rem; }
.name { font-size: 1.6rem; font-weight: 700; }
.strip { display: grid; grid-template-columns: repeat(3, 1fr); gap: 0.8rem; }
.success { border-left: 4px solid #4ECDC4; padding: 0.8rem; }
.warning { border-left: 4px solid #FFB347; padding: 0.8rem; }
.error { border-left: 4px solid #FF6B6B; padding: 0.8rem; }
"#;

/// Everything one page render needs.
#[derive(Debug)]
pub struct Page<'a> {
    pub deployment: Deployment,
    pub api_url: &'a str,
    pub service_up: bool,
    pub checked_at: DateTime<Utc>,
    pub values: &'a FormValues,
    pub phase: &'a Phase,
}

impl Page<'_> {
    pub fn render(&self) -> String {
        let title = escape(self.deployment.title());
        let mut html = format!(
            "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
        );
        html.push_str(&self.status());
        html.push_str(&self.form());
        html.push_str(&self.result());
        if self.deployment == Deployment::Iris {
            html.push_str(&species_strip());
        }
        html.push_str("</body>\n</html>\n");
        html
    }

    fn status(&self) -> String {
        let checked = self.checked_at.format("%H:%M:%S UTC");
        let api = escape(self.api_url);
        if self.service_up {
            format!(
                "<p class=\"status-ok\">✅ API connected at <code>{api}</code></p>\n\
                 <p class=\"checked\">checked {checked}</p>\n"
            )
        } else {
            format!(
                "<p class=\"status-ko\">❌ API not available at <code>{api}</code>. \
                 Start it first with <code>modelserve serve</code>.</p>\n\
                 <p class=\"checked\">checked {checked}</p>\n"
            )
        }
    }

    fn form(&self) -> String {
        let mut html = String::from("<form method=\"post\" action=\"/predict\">\n");
        let values = self.values;
        match self.deployment {
            Deployment::Iris => {
                for control in &IRIS_CONTROLS {
                    html.push_str(&range_input(control, values.get(control.name)));
                }
            }
            Deployment::Purchase => {
                let chosen = values.get("gender").trim();
                html.push_str("<label>Gender<select name=\"gender\">");
                for gender in Gender::ALL {
                    let code = gender.code().to_string();
                    let selected = if code == chosen { " selected" } else { "" };
                    html.push_str(&format!(
                        "<option value=\"{code}\"{selected}>{}</option>",
                        gender.label()
                    ));
                }
                html.push_str("</select></label>\n");
                html.push_str(&range_input(&AGE_CONTROL, values.get(AGE_CONTROL.name)));
                html.push_str(&number_input(&SALARY_CONTROL, values.get(SALARY_CONTROL.name)));
            }
        }

        let label = match self.deployment {
            Deployment::Iris => "🚀 Predict the species",
            Deployment::Purchase => "🔮 Predict",
        };
        // The form stays editable; only submission is blocked.
        let disabled = if self.service_up { "" } else { " disabled" };
        html.push_str(&format!("<button type=\"submit\"{disabled}>{label}</button>\n</form>\n"));
        html
    }

    fn result(&self) -> String {
        match self.phase {
            Phase::Idle | Phase::Submitting => String::new(),
            Phase::Error(msg) => format!("<div class=\"error\">{}</div>\n", escape(msg)),
            Phase::Success(Outcome::Species { label, display }) => format!(
                "<div class=\"card\" id=\"result\">{}\
                 <div>Predicted class: {label}</div></div>\n\
                 <p class=\"success\">✅ Prediction succeeded: <strong>Iris {}</strong></p>\n",
                species_card(display),
                escape(display.name)
            ),
            Phase::Success(Outcome::Purchase {
                probability,
                outcome,
                ..
            }) => {
                let class = if *outcome == PurchaseOutcome::WillBuy {
                    "success"
                } else {
                    "warning"
                };
                format!(
                    "<h2>📊 Prediction result</h2>\n<p class=\"{class}\" id=\"result\">{}</p>\n\
                     <p>Purchase probability: <strong>{}</strong></p>\n",
                    escape(outcome.message()),
                    format_percentage(*probability)
                )
            }
        }
    }
}

fn range_input(control: &Control, value: &str) -> String {
    input("range", control, value)
}

fn number_input(control: &Control, value: &str) -> String {
    input("number", control, value)
}

fn input(kind: &str, control: &Control, value: &str) -> String {
    format!(
        "<label>{label} <output>{value}</output>\
         <input type=\"{kind}\" name=\"{name}\" \
         min=\"{min}\" max=\"{max}\" step=\"{step}\" value=\"{value}\" \
         oninput=\"this.previousElementSibling.value=this.value\"></label>\n",
        label = escape(control.label),
        value = escape(value),
        name = control.name,
        min = control.min,
        max = control.max,
        step = control.step,
    )
}

fn species_card(display: &SpeciesDisplay) -> String {
    format!(
        "<div class=\"icon\">{}</div><div class=\"name\" style=\"color:{}\">{}</div>",
        display.icon,
        escape(display.color),
        escape(display.name)
    )
}

fn species_strip() -> String {
    let mut html = String::from("<h2>🌿 The three iris species</h2>\n<div class=\"strip\">\n");
    for species in IrisSpecies::ALL {
        html.push_str(&format!(
            "<div class=\"card\">{}<div>Class {}</div></div>\n",
            species_card(&species.display()),
            species.label()
        ));
    }
    html.push_str("</div>\n");
    html
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use modelserve_core::PurchaseProfile;

    use crate::form::Input;

    fn page(deployment: Deployment, input: &Input, phase: &Phase, up: bool) -> String {
        render_values(deployment, &FormValues::from(input), phase, up)
    }

    fn render_values(
        deployment: Deployment,
        values: &FormValues,
        phase: &Phase,
        up: bool,
    ) -> String {
        Page {
            deployment,
            api_url: "http://127.0.0.1:8000",
            service_up: up,
            checked_at: Utc::now(),
            values,
            phase,
        }
        .render()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn iris_form_has_bounded_sliders_and_strip() {
        let input = Input::initial(Deployment::Iris);
        let html = page(Deployment::Iris, &input, &Phase::Idle, true);
        assert!(html.contains(r#"min="4" max="8" step="0.1" value="5.8""#));
        assert!(html.contains(r#"min="0.1" max="2.5" step="0.1" value="1.2""#));
        assert!(html.contains(r#"name="sepal_length""#));
        for name in ["Setosa", "Versicolor", "Virginica"] {
            assert!(html.contains(name), "{name}");
        }
        assert!(html.contains("<button type=\"submit\">"));
        assert!(!html.contains("id=\"result\""));
    }

    #[test]
    fn unreachable_service_disables_the_button_only() {
        let input = Input::initial(Deployment::Purchase);
        let html = page(Deployment::Purchase, &input, &Phase::Idle, false);
        assert!(html.contains("<button type=\"submit\" disabled>"));
        assert!(html.contains("API not available"));
        assert!(html.contains(r#"min="18" max="60" step="1" value="30""#));
    }

    #[test]
    fn undecodable_submission_is_echoed_escaped() {
        let form = HashMap::from([
            ("gender".to_string(), "1".to_string()),
            ("age".to_string(), "\"thirty\"".to_string()),
        ]);
        let values = FormValues::submitted(Deployment::Purchase, &form);
        let phase = Phase::Error("⚠️ Invalid value for age".into());
        let html = render_values(Deployment::Purchase, &values, &phase, true);
        assert!(html.contains(r#"value="&quot;thirty&quot;""#));
        assert!(html.contains(r#"<option value="1" selected>Female</option>"#));
        assert!(html.contains(r#"step="1000" value="50000""#));
    }

    #[test]
    fn purchase_result_shows_percentage() {
        let input = Input::Purchase(PurchaseProfile {
            gender: 1,
            age: 55,
            estimated_salary: 140_000,
        });
        let phase = Phase::Success(Outcome::Purchase {
            label: 1,
            probability: 0.8734,
            outcome: PurchaseOutcome::WillBuy,
        });
        let html = page(Deployment::Purchase, &input, &phase, true);
        assert!(html.contains("87.34 %"));
        assert!(html.contains("will probably buy"));
        assert!(html.contains(r#"<option value="1" selected>Female</option>"#));
    }

    #[test]
    fn unknown_species_is_rendered_as_unknown() {
        let input = Input::initial(Deployment::Iris);
        let phase = Phase::Success(Outcome::Species {
            label: 9,
            display: SpeciesDisplay::for_label(9),
        });
        let html = page(Deployment::Iris, &input, &phase, true);
        assert!(html.contains("❓"));
        assert!(html.contains("color:#888\">Unknown"));
        assert!(html.contains("Predicted class: 9"));
    }

    #[test]
    fn error_message_is_escaped() {
        let input = Input::initial(Deployment::Iris);
        let phase = Phase::Error("<script>".into());
        let html = page(Deployment::Iris, &input, &phase, true);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
