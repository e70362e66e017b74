//! Prompt construction for the oracle calls made by the funnel and the
//! orchestrator.
//!
//! Every prompt names the company and its website so the oracle can tell
//! same-named companies apart — the website URL is the identity anchor
//! throughout.

use prospector_shared::{Company, SearchHit};

/// Labels the ICP-fit gates look for.
pub const FIT_LABELS: [&str; 2] = ["FIT", "NOT_FIT"];

/// Labels the relevance check looks for.
pub const RELEVANCE_LABELS: [&str; 2] = ["YES", "NO"];

fn website_str(company: &Company) -> &str {
    company.website.as_ref().map(|u| u.as_str()).unwrap_or("unknown")
}

/// Flatten search hits into a numbered research-context block.
pub fn research_context(hits: &[SearchHit]) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let source = if hit.source.is_empty() {
            "Unknown"
        } else {
            &hit.source
        };
        out.push_str(&format!("Source {}: {}\n{}\n\n", i + 1, source, hit.content));
    }
    out
}

/// ICP-fit judgment used by the screening gates.
pub fn icp_fit(company: &Company, context: &str) -> String {
    format!(
        "You are qualifying companies against an ideal customer profile: \
         early-stage, product-focused software companies that build and sell \
         their own product. Staffing agencies, freelance marketplaces, \
         developer-vetting platforms, outsourcing shops, and large \
         late-stage or acquired companies do not fit.\n\n\
         Company: {name}\nWebsite: {website}\n\n\
         Research data:\n{context}\n\
         Based on this evidence, does {name} fit the profile? \
         Answer with exactly FIT or NOT_FIT.",
        name = company.name,
        website = website_str(company),
    )
}

/// Same-company relevance check for a fetched document, with the home-page
/// summary as ground truth.
pub fn document_relevance(company: &Company, home_summary: &str, excerpt: &str) -> String {
    format!(
        "Does the following content refer to the same company described in \
         the official home page summary?\n\n\
         Company name: {name}\nOfficial website: {website}\n\n\
         Home page summary: {home_summary}\n\n\
         Content to verify: {excerpt}\n\n\
         Answer YES if the content clearly describes the same company (using \
         details like products, leadership, location, or funding); otherwise \
         answer NO. Respond only with YES or NO.",
        name = company.name,
        website = website_str(company),
    )
}

/// System instruction for relevant-content extraction.
pub fn extract_system(company: &Company) -> String {
    format!(
        "You extract comprehensive content about {name} (website: {website}). \
         Distinguish this company from others with similar names by using the \
         website URL as the key identifier.",
        name = company.name,
        website = website_str(company),
    )
}

/// Extract relevant content from a fetched document, bounded in length.
pub fn extract(company: &Company, text: &str) -> String {
    format!(
        "Extract relevant information about {name} (website: {website}) from \
         the following text and provide a summary of no more than 500 words.\n\n{text}",
        name = company.name,
        website = website_str(company),
    )
}

/// System instruction for per-document summarization.
pub fn summarize_system(company: &Company) -> String {
    format!(
        "You summarize content about {name} (website: {website}). Always \
         verify company identity against the website URL when summarizing.",
        name = company.name,
        website = website_str(company),
    )
}

/// Summarize extracted content.
pub fn summarize(company: &Company, text: &str) -> String {
    format!(
        "Provide a summary of the following information about {name} \
         (website: {website}).\n\n{text}",
        name = company.name,
        website = website_str(company),
    )
}

/// The four layered-synthesis instructions. Each is a fresh pass over the
/// full summary set so one focus never dilutes another.
pub fn comprehensive_summary(company: &Company, combined: &str) -> String {
    format!(
        "Review all details in the following summaries about {name} \
         (website: {website}) and write one concise overview paragraph of no \
         more than 250 words. If multiple entities share the name, stay with \
         the one matching the website.\n\n{combined}",
        name = company.name,
        website = website_str(company),
    )
}

pub fn company_summary(company: &Company, combined: &str) -> String {
    format!(
        "From the following summaries about {name} (website: {website}), \
         write a focused summary of the company's core business, products, \
         and services, including its value proposition and target market. \
         Keep it factual and concise.\n\n{combined}",
        name = company.name,
        website = website_str(company),
    )
}

pub fn funding_summary(company: &Company, combined: &str) -> String {
    format!(
        "From the following summaries about {name} (website: {website}), \
         write a focused summary of the company's funding history: total \
         raised, rounds, key investors, and relevant financial metrics. Keep \
         it factual and concise.\n\n{combined}",
        name = company.name,
        website = website_str(company),
    )
}

pub fn team_summary(company: &Company, combined: &str) -> String {
    format!(
        "From the following summaries about {name} (website: {website}), \
         write a focused summary of the company's team: founders, key \
         executives, and relevant leadership background. Keep it factual and \
         concise.\n\n{combined}",
        name = company.name,
        website = website_str(company),
    )
}

/// System instruction for the final ICP profile synthesis.
pub fn icp_profile_system() -> String {
    "You analyze early-stage companies and extract key business-model \
     information. You evaluate source reliability carefully and clearly \
     distinguish verified facts from marketing claims."
        .into()
}

/// The final ICP-focused synthesis over the four layered summaries.
pub fn icp_profile(
    company: &Company,
    comprehensive: &str,
    company_focus: &str,
    funding: &str,
    team: &str,
) -> String {
    format!(
        "Based on the following information about {name} (website: {website}), \
         create a research summary in EXACTLY this format:\n\n\
         {name} business details:\n\
         - [Stage] stage, [verified funding status]\n\
         - [Product type] (e.g., SaaS platform, software product)\n\
         - Revenue split: [e.g., '100% SaaS product (no services)']\n\
         - Team size: [range or number]\n\
         - Product status: [development stage / launch date / traction]\n\
         - Additional metrics: [verified users / customers / growth]\n\n\
         Rules:\n\
         1. Start with exactly '{name} business details:' and use '-' bullets.\n\
         2. Tag every claim with its provenance: (verified: [source]), \
         (reported by: [source]), or (company claimed), with the claim date \
         when available.\n\
         3. When sources conflict, list every version; never silently pick one.\n\
         4. Mark funding as verified only when it comes from an official \
         announcement or a primary financial-news source; otherwise say \
         'reported funding'.\n\n\
         Comprehensive: {comprehensive}\n\
         Company: {company_focus}\n\
         Funding: {funding}\n\
         Team: {team}",
        name = company.name,
        website = website_str(company),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Company {
        Company::new("Acme", Some(url::Url::parse("https://acme.io").unwrap()))
    }

    #[test]
    fn research_context_numbers_sources() {
        let hits = vec![
            SearchHit {
                content: "first".into(),
                source: "https://a.example".into(),
            },
            SearchHit {
                content: "second".into(),
                source: String::new(),
            },
        ];
        let context = research_context(&hits);
        assert!(context.contains("Source 1: https://a.example"));
        assert!(context.contains("Source 2: Unknown"));
        assert!(context.contains("second"));
    }

    #[test]
    fn prompts_carry_the_identity_anchor() {
        let company = acme();
        for prompt in [
            icp_fit(&company, "ctx"),
            document_relevance(&company, "home", "excerpt"),
            extract(&company, "text"),
            summarize(&company, "text"),
            funding_summary(&company, "combined"),
        ] {
            assert!(prompt.contains("Acme"));
            assert!(prompt.contains("https://acme.io"));
        }
    }
}
