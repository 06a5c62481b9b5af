//! Medical vocabulary: a read-only, constant-time membership set of
//! non-PHI medical phrases (spec.md §4.D, §9), ported from the
//! whitelist tables in the teacher's `scorer.rs`.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Exact-match single/multi-word vocabulary entries (disease eponyms,
/// anatomy, section headers) — O(1) lookup via `HashSet`.
static EXACT_VOCABULARY: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(DISEASE_EPONYMS.iter().copied());
    set.extend(ANATOMICAL.iter().copied());
    set.extend(SECTION_HEADERS.iter().copied());
    set
});

/// Substring-match entries (disease names, medications, procedures,
/// organizations) — the teacher scans these via `contains`, since they
/// commonly appear as part of a longer phrase ("Invasive Ductal
/// Carcinoma" containing "carcinoma").
static SUBSTRING_VOCABULARY: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut v = Vec::new();
    v.extend(DISEASE_NAMES.iter().copied());
    v.extend(MEDICATIONS.iter().copied());
    v.extend(PROCEDURES.iter().copied());
    v.extend(ORGANIZATIONS.iter().copied());
    v
});

static DISEASE_EPONYMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "parkinson", "parkinson's", "parkinsons", "alzheimer", "alzheimer's", "alzheimers",
        "hodgkin", "hodgkin's", "hodgkins", "crohn", "crohn's", "crohns", "addison", "addison's",
        "addisons", "cushing", "cushing's", "cushings", "graves", "graves'", "hashimoto",
        "hashimoto's", "hashimotos", "bell's", "bells palsy", "raynaud", "raynaud's", "raynauds",
        "meniere", "meniere's", "menieres", "tourette", "tourette's", "tourettes", "wilson's",
        "huntington", "huntington's", "huntingtons", "marfan", "marfan's", "marfans", "sjogren",
        "sjogren's", "sjogrens", "guillain-barre", "guillain barre", "kaposi", "kaposi's",
        "kaposis", "kawasaki", "paget", "paget's", "pagets", "invasive ductal carcinoma",
        "invasive lobular carcinoma",
    ]
    .into_iter()
    .collect()
});

static DISEASE_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "diabetes", "hypertension", "cancer", "leukemia", "lymphoma", "pneumonia", "bronchitis",
        "asthma", "copd", "emphysema", "arthritis", "osteoporosis", "fibromyalgia", "depression",
        "anxiety", "schizophrenia", "bipolar", "hepatitis", "cirrhosis", "pancreatitis", "stroke",
        "aneurysm", "thrombosis", "embolism", "carcinoma", "melanoma", "sarcoma", "tumor",
        "infection", "sepsis", "abscess", "fracture", "dislocation", "sprain", "anemia",
        "thrombocytopenia", "neutropenia", "dementia", "neuropathy", "myopathy", "colitis",
        "gastritis", "esophagitis", "nephritis", "cystitis", "pyelonephritis", "dermatitis",
        "eczema", "psoriasis", "sinusitis", "otitis", "conjunctivitis",
    ]
    .into_iter()
    .collect()
});

static MEDICATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "lisinopril", "metformin", "amlodipine", "metoprolol", "omeprazole", "simvastatin",
        "losartan", "gabapentin", "hydrochlorothiazide", "atorvastatin", "levothyroxine",
        "prednisone", "amoxicillin", "azithromycin", "alprazolam", "tramadol", "furosemide",
        "pantoprazole", "escitalopram", "sertraline", "fluoxetine", "trazodone", "clopidogrel",
        "warfarin", "aspirin", "ibuprofen", "acetaminophen", "naproxen", "oxycodone", "morphine",
        "fentanyl", "insulin", "methotrexate", "prolia", "humira", "enbrel", "xarelto", "eliquis",
        "pradaxa", "coumadin", "lipitor", "crestor", "zocor", "pravachol", "norvasc", "cardizem",
        "procardia", "lasix", "bumex", "aldactone", "zoloft", "prozac", "lexapro", "celexa",
        "paxil", "xanax", "ativan", "valium", "klonopin", "ambien", "lunesta", "sonata",
    ]
    .into_iter()
    .collect()
});

static PROCEDURES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ct scan", "mri", "x-ray", "xray", "ultrasound", "echocardiogram", "ekg", "ecg", "eeg",
        "colonoscopy", "endoscopy", "bronchoscopy", "laparoscopy", "biopsy", "surgery",
        "operation", "procedure", "catheterization", "angiogram", "angioplasty", "dialysis",
        "chemotherapy", "radiation", "immunotherapy", "physical therapy", "occupational therapy",
        "speech therapy", "mammogram", "pap smear", "bone scan", "pet scan", "injection",
        "infusion", "transfusion",
    ]
    .into_iter()
    .collect()
});

static ANATOMICAL: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abdomen", "pelvis", "thorax", "chest", "head", "neck", "liver", "kidney", "spleen",
        "pancreas", "gallbladder", "heart", "lung", "brain", "spine", "colon", "stomach",
        "intestine", "bladder", "prostate", "uterus", "ovary", "breast", "thyroid", "artery",
        "vein", "nerve", "muscle", "bone", "joint", "skin", "tissue", "membrane", "cartilage",
    ]
    .into_iter()
    .collect()
});

static SECTION_HEADERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "assessment", "plan", "diagnosis", "history", "examination", "medications", "allergies",
        "vitals", "labs", "imaging", "chief complaint", "hpi", "ros", "physical exam",
        "impression", "recommendations", "follow-up", "subjective", "objective", "problem list",
    ]
    .into_iter()
    .collect()
});

static ORGANIZATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "hospital", "clinic", "medical center", "health center", "healthcare", "health system",
        "medical group", "pharmacy", "laboratory", "urgent care", "emergency room",
        "emergency department", "nursing home", "rehabilitation", "hospice",
    ]
    .into_iter()
    .collect()
});

/// `true` if `surface` is a recognized non-PHI medical term (spec.md
/// §4.D rule 1, §9: "constant-time membership").
pub fn is_vocabulary_member(surface: &str) -> bool {
    let lower = surface.to_lowercase();
    if EXACT_VOCABULARY.contains(lower.as_str()) {
        return true;
    }
    SUBSTRING_VOCABULARY
        .iter()
        .any(|term| lower.contains(term))
}
