//! Template generator registry.
//!
//! Maps a template id to a pure function `(entry, rng) -> GeneratedBody`.
//! Generators draw every random value from the supplied [`SeededRng`] and
//! record the drawn inputs in `variant`, so the worked steps can always be
//! recomputed from the returned body.

use std::collections::BTreeMap;

use serde_json::json;

use crate::error::GenerateError;
use crate::model::{Answer, Entry, ParamValue};
use crate::rng::SeededRng;

/// Output of a generator. Fields left `None` fall back to the entry's
/// static values during hydration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedBody {
    pub prompt: String,
    pub choices: Option<Vec<String>>,
    pub answer: Option<Answer>,
    pub tolerance: Option<f64>,
    pub relative_tolerance: Option<f64>,
    pub unit_hint: Option<String>,
    pub items: Option<Vec<String>>,
    pub left: Option<Vec<String>>,
    pub right: Option<Vec<String>>,
    pub correct_order: Option<Vec<usize>>,
    pub explanation: Option<String>,
    pub steps: Option<Vec<String>>,
    /// Raw inputs drawn for this instance.
    pub variant: Option<serde_json::Value>,
}

/// Signature shared by all generators.
pub type GeneratorFn = fn(&Entry, &mut SeededRng) -> Result<GeneratedBody, GenerateError>;

/// Template id → generator lookup.
#[derive(Clone)]
pub struct Registry {
    generators: BTreeMap<String, GeneratorFn>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("templates", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// The payroll generators shipped with examforge.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("overtime_gross_v1", overtime_gross);
        registry.register("blended_rate_v1", blended_rate);
        registry.register("earnings_mix_v1", earnings_mix);
        registry.register("pretax_posttax_v1", pretax_posttax);
        registry.register("percent_deduction_cap_v1", percent_deduction_cap);
        registry.register("pay_period_convert_v1", pay_period_convert);
        registry.register("rounding_rule_v1", rounding_rule);
        registry.register("reconciliation_v1", reconciliation);
        registry.register("variance_detective_v1", variance_detective);
        registry.register("net_pay_v1", net_pay);
        registry.register("order_pay_stub_v1", order_pay_stub);
        registry.register("match_tax_terms_v1", match_tax_terms);
        registry.register("multi_numeric_breakdown_v1", multi_numeric_breakdown);
        registry
    }

    pub fn register(&mut self, template_id: impl Into<String>, generator: GeneratorFn) {
        self.generators.insert(template_id.into(), generator);
    }

    pub fn get(&self, template_id: &str) -> Option<GeneratorFn> {
        self.generators.get(template_id).copied()
    }

    pub fn contains(&self, template_id: &str) -> bool {
        self.generators.contains_key(template_id)
    }

    pub fn template_ids(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Round to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

/// Typed access to an entry's generator parameters.
struct Params<'a> {
    template_id: &'a str,
    params: Option<&'a BTreeMap<String, ParamValue>>,
}

impl<'a> Params<'a> {
    fn of(entry: &'a Entry) -> Self {
        Self {
            template_id: entry.template_id.as_deref().unwrap_or_default(),
            params: entry.generator.as_ref().map(|g| &g.params),
        }
    }

    fn raw(&self, name: &str) -> Option<&'a ParamValue> {
        self.params.and_then(|p| p.get(name))
    }

    fn missing(&self, name: &str) -> GenerateError {
        GenerateError::MissingParam {
            template_id: self.template_id.to_string(),
            param: name.to_string(),
        }
    }

    fn malformed(&self, name: &str, reason: &str) -> GenerateError {
        GenerateError::MalformedParam {
            template_id: self.template_id.to_string(),
            param: name.to_string(),
            reason: reason.to_string(),
        }
    }

    fn number(&self, name: &str) -> Result<f64, GenerateError> {
        match self.raw(name) {
            Some(ParamValue::Number(n)) if n.is_finite() => Ok(*n),
            Some(_) => Err(self.malformed(name, "expected a finite number")),
            None => Err(self.missing(name)),
        }
    }

    fn number_or(&self, name: &str, default: f64) -> Result<f64, GenerateError> {
        match self.raw(name) {
            None => Ok(default),
            Some(_) => self.number(name),
        }
    }

    fn list(&self, name: &str) -> Result<&'a [f64], GenerateError> {
        match self.raw(name) {
            Some(ParamValue::List(v)) if !v.is_empty() => Ok(v.as_slice()),
            Some(_) => Err(self.malformed(name, "expected a non-empty list")),
            None => Err(self.missing(name)),
        }
    }

    /// Reads `<name>_min` / `<name>_max`.
    fn float_range(&self, name: &str) -> Result<(f64, f64), GenerateError> {
        let min = self.number(&format!("{name}_min"))?;
        let max = self.number(&format!("{name}_max"))?;
        if min > max {
            return Err(GenerateError::InvertedRange {
                template_id: self.template_id.to_string(),
                param: name.to_string(),
                min,
                max,
            });
        }
        Ok((min, max))
    }

    fn int_range(&self, name: &str) -> Result<(i64, i64), GenerateError> {
        let (min, max) = self.float_range(name)?;
        if min.fract() != 0.0 || max.fract() != 0.0 {
            return Err(self.malformed(name, "integer range expected"));
        }
        Ok((min as i64, max as i64))
    }

    fn draw_int(&self, name: &str, rng: &mut SeededRng) -> Result<i64, GenerateError> {
        let (min, max) = self.int_range(name)?;
        Ok(rng.int_between(min, max))
    }
}

// ---------------------------------------------------------------------------
// Earnings
// ---------------------------------------------------------------------------

fn overtime_gross(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let rate = params.draw_int("rate", rng)?;
    let hours = params.draw_int("hours", rng)?;
    let ot_multiplier = params.number_or("ot_multiplier", 1.5)?;

    let overtime_hours = (hours - 40).max(0);
    let regular_hours = hours - overtime_hours;
    let regular_pay = (regular_hours * rate) as f64;
    let overtime_pay = (overtime_hours * rate) as f64 * ot_multiplier;
    let gross = regular_pay + overtime_pay;

    Ok(GeneratedBody {
        prompt: format!(
            "An employee earns ${rate}/hour and worked {hours} hours. Overtime is paid at {ot_multiplier}x. What is gross pay?"
        ),
        answer: Some(Answer::Number(round_cents(gross))),
        tolerance: Some(0.02),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Regular hours: {regular_hours} x ${rate} = {}", money(regular_pay)),
            format!(
                "OT hours: {overtime_hours} x ${rate} x {ot_multiplier} = {}",
                money(overtime_pay)
            ),
            format!("Gross = regular + OT = {}", money(gross)),
        ]),
        variant: Some(json!({ "rate": rate, "hours": hours, "ot_multiplier": ot_multiplier })),
        ..Default::default()
    })
}

fn blended_rate(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let rate = params.draw_int("rate", rng)?;
    let hours = params.draw_int("hours", rng)?;
    let bonus = params.draw_int("bonus", rng)?;
    if hours <= 0 {
        return Err(params.malformed("hours", "hours must be positive"));
    }

    let base = (rate * hours) as f64;
    let regular_rate = (base + bonus as f64) / hours as f64;
    let overtime_hours = (hours - 40).max(0);
    let ot_premium = overtime_hours as f64 * (regular_rate * 0.5);
    let gross = base + bonus as f64 + ot_premium;

    Ok(GeneratedBody {
        prompt: format!(
            "An employee earns ${rate}/hour and worked {hours} hours with a nondiscretionary bonus of ${bonus}. Using a blended regular rate, what is the total gross pay?"
        ),
        answer: Some(Answer::Number(round_cents(gross))),
        tolerance: Some(0.05),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!(
                "Regular rate = (base earnings + bonus) / hours = {}",
                money(regular_rate)
            ),
            format!(
                "OT premium = OT hours x (regular rate x 0.5) = {}",
                money(ot_premium)
            ),
            format!("Gross = base earnings + bonus + OT premium = {}", money(gross)),
        ]),
        variant: Some(json!({ "rate": rate, "hours": hours, "bonus": bonus })),
        ..Default::default()
    })
}

fn earnings_mix(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let rate = params.draw_int("rate", rng)?;
    let reg_hours = params.draw_int("reg_hours", rng)?;
    let ot_hours = params.draw_int("ot_hours", rng)?;
    let shift_diff = params.draw_int("shift_diff", rng)?;
    let stipend = params.draw_int("stipend", rng)?;

    let regular = (reg_hours * rate) as f64;
    let overtime = (ot_hours * rate) as f64 * 1.5;
    let shift_pay = (reg_hours * shift_diff) as f64;
    let gross = regular + overtime + shift_pay + stipend as f64;

    Ok(GeneratedBody {
        prompt: format!(
            "Calculate gross pay: rate ${rate}/hr, {reg_hours} regular hours, {ot_hours} OT hours at 1.5x, shift diff ${shift_diff}/hr for regular hours, stipend ${stipend}."
        ),
        answer: Some(Answer::Number(round_cents(gross))),
        tolerance: Some(0.05),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Regular: {}", money(regular)),
            format!("OT: {}", money(overtime)),
            format!("Shift diff: {}", money(shift_pay)),
            format!("Stipend: {}", money(stipend as f64)),
            format!("Gross: {}", money(gross)),
        ]),
        variant: Some(json!({
            "rate": rate,
            "reg_hours": reg_hours,
            "ot_hours": ot_hours,
            "shift_diff": shift_diff,
            "stipend": stipend,
        })),
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Deductions & conversions
// ---------------------------------------------------------------------------

fn pretax_posttax(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let gross = params.draw_int("gross", rng)?;
    let pretax_perc = params.draw_int("pretax_perc", rng)?;
    let pretax_flat = params.draw_int("pretax_flat", rng)?;
    let posttax_perc = params.draw_int("posttax_perc", rng)?;

    let gross_f = gross as f64;
    let pretax = gross_f * (pretax_perc as f64 / 100.0) + pretax_flat as f64;
    let taxable = gross_f - pretax;
    let posttax = taxable * (posttax_perc as f64 / 100.0);
    let net = gross_f - pretax - posttax;

    Ok(GeneratedBody {
        prompt: format!(
            "Gross pay is ${gross}. Pre-tax deductions: {pretax_perc}% plus ${pretax_flat}. Post-tax deduction: {posttax_perc}% of taxable wages. What is net pay?"
        ),
        answer: Some(Answer::Number(round_cents(net))),
        tolerance: Some(0.05),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Pre-tax: {}", money(pretax)),
            format!("Taxable wages: {}", money(taxable)),
            format!("Post-tax: {}", money(posttax)),
            format!("Net: {}", money(net)),
        ]),
        variant: Some(json!({
            "gross": gross,
            "pretax_perc": pretax_perc,
            "pretax_flat": pretax_flat,
            "posttax_perc": posttax_perc,
        })),
        ..Default::default()
    })
}

fn percent_deduction_cap(
    entry: &Entry,
    rng: &mut SeededRng,
) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let gross = params.draw_int("gross", rng)?;
    let rate = params.draw_int("rate", rng)?;
    let cap = params.draw_int("cap", rng)?;

    let calculated = gross as f64 * (rate as f64 / 100.0);
    let deduction = calculated.min(cap as f64);

    Ok(GeneratedBody {
        prompt: format!(
            "A voluntary deduction is {rate}% of gross pay, not to exceed ${cap}. Gross pay is ${gross}. What is the deduction amount?"
        ),
        answer: Some(Answer::Number(round_cents(deduction))),
        tolerance: Some(0.02),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Calculated deduction: {}", money(calculated)),
            format!("Apply cap: {}", money(deduction)),
        ]),
        variant: Some(json!({ "gross": gross, "rate": rate, "cap": cap })),
        ..Default::default()
    })
}

fn pay_period_convert(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let annual = params.draw_int("annual", rng)?;
    let periods = params.list("periods")?;
    let period = *rng.pick(periods)?;
    if period <= 0.0 {
        return Err(params.malformed("periods", "pay periods must be positive"));
    }

    let per_period = annual as f64 / period;

    Ok(GeneratedBody {
        prompt: format!(
            "An employee earns ${annual} annually. What is the equivalent per-pay-period amount for {period} pay periods?"
        ),
        answer: Some(Answer::Number(round_cents(per_period))),
        tolerance: Some(0.05),
        unit_hint: Some("$".into()),
        steps: Some(vec![format!(
            "Annual salary / pay periods = ${annual} / {period} = {}",
            money(per_period)
        )]),
        variant: Some(json!({ "annual": annual, "period": period })),
        ..Default::default()
    })
}

fn rounding_rule(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let (rate_min, rate_max) = params.float_range("rate")?;
    let (hours_min, hours_max) = params.float_range("hours")?;
    // Three decimals so rounding the components first actually matters.
    let rate = round_mills(rng.float_between(rate_min, rate_max));
    let hours = round_mills(rng.float_between(hours_min, hours_max));

    let rounded_rate = round_cents(rate);
    let rounded_hours = round_cents(hours);
    let rounded_component = round_cents(rounded_rate * rounded_hours);
    let round_at_end = round_cents(rate * hours);

    Ok(GeneratedBody {
        prompt: format!(
            "An employee worked {hours} hours at ${rate}/hr. If you round each component to 2 decimals before multiplying, what gross pay results?"
        ),
        answer: Some(Answer::Number(rounded_component)),
        tolerance: Some(0.02),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Rounded rate: ${rounded_rate:.2}, rounded hours: {rounded_hours:.2}"),
            format!(
                "Multiply: {rounded_rate:.2} x {rounded_hours:.2} = {} (round at end would be {})",
                money(rounded_component),
                money(round_at_end)
            ),
        ]),
        variant: Some(json!({ "rate": rate, "hours": hours })),
        ..Default::default()
    })
}

fn round_mills(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// Reconciliation & controls
// ---------------------------------------------------------------------------

fn reconciliation(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let item_count = params.draw_int("item", rng)?.max(0);
    let (amount_min, amount_max) = params.int_range("amount")?;
    let amounts: Vec<i64> = (0..item_count)
        .map(|_| rng.int_between(amount_min, amount_max))
        .collect();
    let total: i64 = amounts.iter().sum();

    let listed = amounts
        .iter()
        .map(|a| format!("${a}"))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(GeneratedBody {
        prompt: format!(
            "Reconcile the payroll register by summing: {listed}. What is the total?"
        ),
        answer: Some(Answer::Number(total as f64)),
        tolerance: Some(0.01),
        unit_hint: Some("$".into()),
        steps: Some(vec![format!("Sum all line items: {}", money(total as f64))]),
        variant: Some(json!({ "amounts": amounts })),
        ..Default::default()
    })
}

fn variance_detective(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let variance = params.draw_int("variance", rng)?;

    Ok(GeneratedBody {
        prompt: format!(
            "Payroll expense increased by ${variance} this period. Which action is the best first step?"
        ),
        choices: Some(vec![
            "Validate variance with reports and approvals".into(),
            "Ignore it".into(),
            "Delete prior period data".into(),
            "Delay payroll".into(),
        ]),
        answer: Some(Answer::Index(0)),
        explanation: Some(
            "Validating the variance with source reports is the first audit step.".into(),
        ),
        variant: Some(json!({ "variance": variance })),
        ..Default::default()
    })
}

fn net_pay(entry: &Entry, rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let gross = params.draw_int("gross", rng)?;
    let tax_rate = params.draw_int("tax_rate", rng)?;
    let deduction = params.draw_int("deduction", rng)?;

    let tax = gross as f64 * (tax_rate as f64 / 100.0);
    let net = gross as f64 - tax - deduction as f64;

    Ok(GeneratedBody {
        prompt: format!(
            "Gross pay is ${gross}. Taxes are {tax_rate}% and deductions total ${deduction}. What is net pay?"
        ),
        answer: Some(Answer::Number(round_cents(net))),
        tolerance: Some(0.05),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Tax: {}", money(tax)),
            format!("Net: {}", money(net)),
        ]),
        variant: Some(json!({ "gross": gross, "tax_rate": tax_rate, "deduction": deduction })),
        ..Default::default()
    })
}

fn order_pay_stub(_entry: &Entry, _rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    Ok(GeneratedBody {
        prompt: "Order the pay stub sections from top to bottom.".into(),
        items: Some(vec![
            "Employee info".into(),
            "Earnings".into(),
            "Taxes".into(),
            "Deductions".into(),
            "Net pay".into(),
        ]),
        correct_order: Some(vec![0, 1, 2, 3, 4]),
        ..Default::default()
    })
}

fn match_tax_terms(_entry: &Entry, _rng: &mut SeededRng) -> Result<GeneratedBody, GenerateError> {
    Ok(GeneratedBody {
        prompt: "Match the tax term to its description.".into(),
        left: Some(vec![
            "Withholding".into(),
            "Taxable wages".into(),
            "Exemption".into(),
        ]),
        right: Some(vec![
            "Amount subject to tax".into(),
            "Reduction allowed by policy".into(),
            "Amount held from pay".into(),
        ]),
        answer: Some(Answer::Indices(vec![2, 0, 1])),
        ..Default::default()
    })
}

fn multi_numeric_breakdown(
    entry: &Entry,
    rng: &mut SeededRng,
) -> Result<GeneratedBody, GenerateError> {
    let params = Params::of(entry);
    let rate = params.draw_int("rate", rng)?;
    let hours = params.draw_int("hours", rng)?;
    let tax_rate = params.draw_int("tax_rate", rng)?;

    let gross = (rate * hours) as f64;
    let tax = gross * (tax_rate as f64 / 100.0);
    let net = gross - tax;

    Ok(GeneratedBody {
        prompt: format!(
            "Compute the following: (1) Gross pay for {hours} hours at ${rate}/hr, (2) Tax at {tax_rate}%, (3) Net pay."
        ),
        answer: Some(Answer::Numbers(vec![
            round_cents(gross),
            round_cents(tax),
            round_cents(net),
        ])),
        tolerance: Some(0.05),
        unit_hint: Some("$".into()),
        steps: Some(vec![
            format!("Gross = hours x rate = {}", money(gross)),
            format!("Tax = gross x rate = {}", money(tax)),
            format!("Net = gross - tax = {}", money(net)),
        ]),
        variant: Some(json!({ "rate": rate, "hours": hours, "tax_rate": tax_rate })),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Domain, GeneratorSpec, QuestionType};

    fn template(id: &str, kind: QuestionType, params: &[(&str, ParamValue)]) -> Entry {
        let mut entry = Entry::new(Domain::Calculations, Difficulty::Medium, kind);
        entry.template_id = Some(id.into());
        entry.generator = Some(GeneratorSpec {
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        entry
    }

    fn n(v: f64) -> ParamValue {
        ParamValue::Number(v)
    }

    fn run(entry: &Entry, seed: &str) -> GeneratedBody {
        let generator = Registry::builtin()
            .get(entry.template_id.as_deref().unwrap())
            .unwrap();
        generator(entry, &mut SeededRng::new(seed)).unwrap()
    }

    fn var(body: &GeneratedBody, key: &str) -> f64 {
        body.variant.as_ref().unwrap()[key].as_f64().unwrap()
    }

    fn answer(body: &GeneratedBody) -> f64 {
        body.answer.as_ref().unwrap().as_number().unwrap()
    }

    #[test]
    fn builtin_registers_all_templates() {
        let registry = Registry::builtin();
        assert_eq!(registry.template_ids().count(), 13);
        assert!(registry.contains("overtime_gross_v1"));
        assert!(registry.contains("multi_numeric_breakdown_v1"));
        assert!(!registry.contains("nope_v1"));
    }

    #[test]
    fn overtime_gross_fixed_inputs() {
        let entry = template(
            "overtime_gross_v1",
            QuestionType::Numeric,
            &[
                ("rate_min", n(20.0)),
                ("rate_max", n(20.0)),
                ("hours_min", n(45.0)),
                ("hours_max", n(45.0)),
                ("ot_multiplier", n(1.5)),
            ],
        );
        let body = run(&entry, "fixed");
        assert_eq!(answer(&body), 950.0);
        assert_eq!(body.tolerance, Some(0.02));
        let steps = body.steps.unwrap();
        assert_eq!(steps[0], "Regular hours: 40 x $20 = $800.00");
        assert_eq!(steps[1], "OT hours: 5 x $20 x 1.5 = $150.00");
        assert_eq!(steps[2], "Gross = regular + OT = $950.00");
        assert!(body.prompt.contains("worked 45 hours"));
    }

    #[test]
    fn overtime_gross_recomputes_from_variant() {
        let entry = template(
            "overtime_gross_v1",
            QuestionType::Numeric,
            &[
                ("rate_min", n(15.0)),
                ("rate_max", n(40.0)),
                ("hours_min", n(30.0)),
                ("hours_max", n(55.0)),
            ],
        );
        for i in 0..50 {
            let body = run(&entry, &format!("ot-{i}"));
            let rate = var(&body, "rate");
            let hours = var(&body, "hours");
            let mult = var(&body, "ot_multiplier");
            let ot = (hours - 40.0).max(0.0);
            let expected = (hours - ot) * rate + ot * rate * mult;
            assert!((answer(&body) - expected).abs() <= 0.02);
        }
    }

    #[test]
    fn blended_rate_recomputes_from_variant() {
        let entry = template(
            "blended_rate_v1",
            QuestionType::Numeric,
            &[
                ("rate_min", n(15.0)),
                ("rate_max", n(30.0)),
                ("hours_min", n(38.0)),
                ("hours_max", n(50.0)),
                ("bonus_min", n(50.0)),
                ("bonus_max", n(300.0)),
            ],
        );
        for i in 0..50 {
            let body = run(&entry, &format!("blend-{i}"));
            let (rate, hours, bonus) = (var(&body, "rate"), var(&body, "hours"), var(&body, "bonus"));
            let regular_rate = (rate * hours + bonus) / hours;
            let expected = rate * hours + bonus + (hours - 40.0).max(0.0) * regular_rate * 0.5;
            assert!((answer(&body) - expected).abs() <= 0.05);
        }
    }

    #[test]
    fn earnings_mix_recomputes_from_variant() {
        let entry = template(
            "earnings_mix_v1",
            QuestionType::Numeric,
            &[
                ("rate_min", n(15.0)),
                ("rate_max", n(30.0)),
                ("reg_hours_min", n(30.0)),
                ("reg_hours_max", n(40.0)),
                ("ot_hours_min", n(0.0)),
                ("ot_hours_max", n(10.0)),
                ("shift_diff_min", n(1.0)),
                ("shift_diff_max", n(3.0)),
                ("stipend_min", n(25.0)),
                ("stipend_max", n(100.0)),
            ],
        );
        let body = run(&entry, "mix");
        let expected = var(&body, "reg_hours") * var(&body, "rate")
            + var(&body, "ot_hours") * var(&body, "rate") * 1.5
            + var(&body, "reg_hours") * var(&body, "shift_diff")
            + var(&body, "stipend");
        assert!((answer(&body) - expected).abs() <= 0.05);
        assert_eq!(body.steps.unwrap().len(), 5);
    }

    #[test]
    fn pretax_posttax_recomputes_from_variant() {
        let entry = template(
            "pretax_posttax_v1",
            QuestionType::Numeric,
            &[
                ("gross_min", n(1000.0)),
                ("gross_max", n(3000.0)),
                ("pretax_perc_min", n(2.0)),
                ("pretax_perc_max", n(8.0)),
                ("pretax_flat_min", n(10.0)),
                ("pretax_flat_max", n(50.0)),
                ("posttax_perc_min", n(1.0)),
                ("posttax_perc_max", n(5.0)),
            ],
        );
        for i in 0..30 {
            let body = run(&entry, &format!("pp-{i}"));
            let gross = var(&body, "gross");
            let pretax = gross * var(&body, "pretax_perc") / 100.0 + var(&body, "pretax_flat");
            let posttax = (gross - pretax) * var(&body, "posttax_perc") / 100.0;
            assert!((answer(&body) - (gross - pretax - posttax)).abs() <= 0.05);
        }
    }

    #[test]
    fn deduction_cap_applies_cap() {
        let entry = template(
            "percent_deduction_cap_v1",
            QuestionType::Numeric,
            &[
                ("gross_min", n(5000.0)),
                ("gross_max", n(5000.0)),
                ("rate_min", n(10.0)),
                ("rate_max", n(10.0)),
                ("cap_min", n(300.0)),
                ("cap_max", n(300.0)),
            ],
        );
        let body = run(&entry, "cap");
        assert_eq!(answer(&body), 300.0);
        assert_eq!(body.steps.unwrap()[0], "Calculated deduction: $500.00");
    }

    #[test]
    fn pay_period_picks_from_list() {
        let entry = template(
            "pay_period_convert_v1",
            QuestionType::Numeric,
            &[
                ("annual_min", n(52000.0)),
                ("annual_max", n(52000.0)),
                ("periods", ParamValue::List(vec![26.0])),
            ],
        );
        let body = run(&entry, "period");
        assert_eq!(var(&body, "period"), 26.0);
        assert_eq!(answer(&body), 2000.0);
    }

    #[test]
    fn pay_period_requires_periods() {
        let entry = template(
            "pay_period_convert_v1",
            QuestionType::Numeric,
            &[("annual_min", n(1.0)), ("annual_max", n(2.0))],
        );
        let generator = Registry::builtin().get("pay_period_convert_v1").unwrap();
        let err = generator(&entry, &mut SeededRng::new("x")).unwrap_err();
        assert!(matches!(err, GenerateError::MissingParam { ref param, .. } if param == "periods"));
    }

    #[test]
    fn rounding_rule_uses_rounded_components() {
        let entry = template(
            "rounding_rule_v1",
            QuestionType::Numeric,
            &[
                ("rate_min", n(15.0)),
                ("rate_max", n(25.0)),
                ("hours_min", n(30.0)),
                ("hours_max", n(45.0)),
            ],
        );
        for i in 0..30 {
            let body = run(&entry, &format!("round-{i}"));
            let rate = var(&body, "rate");
            let hours = var(&body, "hours");
            assert_eq!(rate, round_mills(rate));
            assert_eq!(
                answer(&body),
                round_cents(round_cents(rate) * round_cents(hours))
            );
            let steps = body.steps.as_ref().unwrap();
            assert!(steps[1].contains(&format!(
                "(round at end would be ${:.2})",
                round_cents(rate * hours)
            )));
        }
    }

    #[test]
    fn reconciliation_sums_amounts() {
        let entry = template(
            "reconciliation_v1",
            QuestionType::Numeric,
            &[
                ("item_min", n(3.0)),
                ("item_max", n(6.0)),
                ("amount_min", n(100.0)),
                ("amount_max", n(900.0)),
            ],
        );
        let body = run(&entry, "recon");
        let amounts = body.variant.as_ref().unwrap()["amounts"].as_array().unwrap().clone();
        assert!((3..=6).contains(&amounts.len()));
        let sum: f64 = amounts.iter().map(|a| a.as_f64().unwrap()).sum();
        assert_eq!(answer(&body), sum);
    }

    #[test]
    fn variance_detective_is_single_choice() {
        let entry = template(
            "variance_detective_v1",
            QuestionType::Mcq,
            &[("variance_min", n(500.0)), ("variance_max", n(5000.0))],
        );
        let body = run(&entry, "var");
        assert_eq!(body.answer, Some(Answer::Index(0)));
        assert_eq!(body.choices.unwrap().len(), 4);
        assert!(body.explanation.is_some());
    }

    #[test]
    fn net_pay_recomputes_from_variant() {
        let entry = template(
            "net_pay_v1",
            QuestionType::Numeric,
            &[
                ("gross_min", n(800.0)),
                ("gross_max", n(2500.0)),
                ("tax_rate_min", n(10.0)),
                ("tax_rate_max", n(25.0)),
                ("deduction_min", n(20.0)),
                ("deduction_max", n(150.0)),
            ],
        );
        let body = run(&entry, "net");
        let gross = var(&body, "gross");
        let expected = gross - gross * var(&body, "tax_rate") / 100.0 - var(&body, "deduction");
        assert!((answer(&body) - expected).abs() <= 0.05);
    }

    #[test]
    fn static_shape_generators() {
        let order = run(&template("order_pay_stub_v1", QuestionType::Order, &[]), "o");
        assert_eq!(order.correct_order, Some(vec![0, 1, 2, 3, 4]));
        assert_eq!(order.items.unwrap().len(), 5);

        let matching = run(&template("match_tax_terms_v1", QuestionType::Match, &[]), "m");
        assert_eq!(matching.answer, Some(Answer::Indices(vec![2, 0, 1])));
        assert_eq!(matching.left.unwrap().len(), matching.right.unwrap().len());
    }

    #[test]
    fn multi_numeric_breakdown_is_consistent() {
        let entry = template(
            "multi_numeric_breakdown_v1",
            QuestionType::MultiNumeric,
            &[
                ("rate_min", n(20.0)),
                ("rate_max", n(20.0)),
                ("hours_min", n(40.0)),
                ("hours_max", n(40.0)),
                ("tax_rate_min", n(15.0)),
                ("tax_rate_max", n(15.0)),
            ],
        );
        let body = run(&entry, "multi");
        assert_eq!(
            body.answer,
            Some(Answer::Numbers(vec![800.0, 120.0, 680.0]))
        );
    }

    #[test]
    fn inverted_range_is_reported() {
        let entry = template(
            "net_pay_v1",
            QuestionType::Numeric,
            &[("gross_min", n(10.0)), ("gross_max", n(5.0))],
        );
        let generator = Registry::builtin().get("net_pay_v1").unwrap();
        let err = generator(&entry, &mut SeededRng::new("inv")).unwrap_err();
        assert!(matches!(err, GenerateError::InvertedRange { .. }));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let entry = template(
            "net_pay_v1",
            QuestionType::Numeric,
            &[
                ("gross_min", n(800.0)),
                ("gross_max", n(2500.0)),
                ("tax_rate_min", n(10.0)),
                ("tax_rate_max", n(25.0)),
                ("deduction_min", n(20.0)),
                ("deduction_max", n(150.0)),
            ],
        );
        assert_eq!(run(&entry, "same"), run(&entry, "same"));
    }
}
