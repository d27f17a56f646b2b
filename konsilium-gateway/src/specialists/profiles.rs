//! Built-in specialist definitions: persona prompt, index domain and
//! categorization rules for each clinical subdomain.

use super::categorize::{
    BPH_HEADER, CategoryRule, DIAGNOSIS_HEADER, PREVENTION_HEADER, TREATMENT_HEADER,
};

/// One domain-scoped answering capability.
#[derive(Debug, Clone, Copy)]
pub struct SpecialistProfile {
    /// Stable routing key, used in URLs and report attribution.
    pub key: &'static str,
    pub display_name: &'static str,
    /// Domain tag of the guideline segments this specialist grounds on.
    pub domain: &'static str,
    pub system_prompt: &'static str,
    pub rules: &'static [CategoryRule],
}

pub fn builtin_profiles() -> Vec<SpecialistProfile> {
    vec![bladder(), prostate()]
}

const BLADDER_RULES: &[CategoryRule] = &[
    CategoryRule {
        header: DIAGNOSIS_HEADER,
        keywords: &["diagnosis", "symptom"],
    },
    CategoryRule {
        header: TREATMENT_HEADER,
        keywords: &["treatment", "therapy", "bcg"],
    },
    CategoryRule {
        header: PREVENTION_HEADER,
        keywords: &["prevention", "risk"],
    },
];

pub fn bladder() -> SpecialistProfile {
    SpecialistProfile {
        key: "bladder",
        display_name: "DR_BLADDER",
        domain: "bladder",
        system_prompt: "\
You are DR_BLADDER, a specialized medical AI assistant focused on bladder cancer.

Your expertise includes:
- Bladder cancer diagnosis and staging
- Treatment options (BCG therapy, chemotherapy, surgical interventions)
- Risk factors and prevention
- Patient care and follow-up protocols
- Latest EAU clinical guidelines

Guidelines:
1. Provide evidence-based medical information
2. Use appropriate medical terminology with explanations
3. Consider patient safety and emphasize professional consultation
4. Structure responses clearly with sections when appropriate
5. Include relevant statistics and success rates when available

Remember: Always recommend consultation with healthcare professionals for \
personal medical decisions.",
        rules: BLADDER_RULES,
    }
}

const PROSTATE_RULES: &[CategoryRule] = &[
    CategoryRule {
        header: DIAGNOSIS_HEADER,
        keywords: &["diagnosis", "psa", "gleason", "symptom"],
    },
    CategoryRule {
        header: TREATMENT_HEADER,
        keywords: &["treatment", "therapy", "surgery", "radiation"],
    },
    CategoryRule {
        header: PREVENTION_HEADER,
        keywords: &["prevention", "risk", "screening"],
    },
    CategoryRule {
        header: BPH_HEADER,
        keywords: &["bph", "hyperplasia", "urinary"],
    },
];

pub fn prostate() -> SpecialistProfile {
    SpecialistProfile {
        key: "prostate",
        display_name: "DR_PROSTATE",
        domain: "prostate",
        system_prompt: "\
You are DR_PROSTATE, a specialized medical AI assistant focused on prostate \
diseases including prostate cancer and benign prostatic hyperplasia (BPH).

Your expertise includes:
- Prostate cancer diagnosis, staging, and risk stratification
- Treatment options (active surveillance, surgery, radiation therapy, \
hormonal therapy, chemotherapy)
- Benign prostatic hyperplasia (BPH) management
- PSA testing and interpretation
- Gleason scoring and prognostic indicators
- Latest EAU-EANM-ESTRO-ESUR-ISUP-SIOG guidelines
- Quality of life considerations and side effect management

Guidelines:
1. Provide evidence-based medical information following current EAU guidelines
2. Use appropriate medical terminology with clear explanations
3. Consider patient safety and emphasize professional consultation
4. Structure responses clearly with sections when appropriate
5. Include relevant statistics, success rates, and risk assessments
6. Address both cancer and benign conditions appropriately

Remember: Always recommend consultation with urologists and oncologists for \
personal medical decisions.",
        rules: PROSTATE_RULES,
    }
}
