//! Prompt text for the two completion rounds.

use crate::Candidate;

/// Stage 1: ask for the metric named in `question`, as `Metric: <name>`.
pub fn extraction_prompt(question: &str) -> String {
    format!(
        "From the query '{question}', determine what the metric being calculated is. \
         Reply only in the form: Metric: [the metric from the query]"
    )
}

/// One line per candidate: `name (description): [dim1, dim2]`.
pub fn candidate_block(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            format!(
                "{} ({}): [{}]",
                c.entry.name,
                c.entry.description,
                c.entry.dimensions.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 2: pick one metric from the block and answer in exactly three lines.
pub fn shaping_prompt(question: &str, candidates: &[Candidate]) -> String {
    let block = candidate_block(candidates);
    format!(
        "Your task is to give what columns to group by and what columns to filter by to answer the question '{question}'.
`dimensions` are the names of dimensions comma-separated.
`filters` are comma-separated filters like in a sql query using dimension names e.g. `dimension.col=something`.

Here is a list of \"metric name (metric description): [columns]\":
{block}

You may choose only a single metric.
Be sure to only use columns from the list for your chosen metric in the dimension and filter query parameters.

Respond with only these three lines:

Metric: your chosen metric name
GroupBys: comma-separated values for your chosen columns
Filters: comma-separated valid SQL filter expressions using your chosen columns"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::MetricEntry;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                index: 1,
                score: 0.9,
                entry: MetricEntry::new("revenue", "Total revenue", ["region", "day"]),
            },
            Candidate {
                index: 0,
                score: 0.4,
                entry: MetricEntry::new("dau", "Daily active users", Vec::<String>::new()),
            },
        ]
    }

    #[test]
    fn extraction_prompt_quotes_question() {
        let p = extraction_prompt("how much revenue yesterday?");
        assert!(p.contains("'how much revenue yesterday?'"));
        assert!(p.contains("Metric: [the metric from the query]"));
    }

    #[test]
    fn block_has_one_line_per_candidate() {
        let block = candidate_block(&candidates());
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "revenue (Total revenue): [region, day]",
                "dau (Daily active users): []",
            ]
        );
    }

    #[test]
    fn empty_block_is_empty() {
        assert_eq!(candidate_block(&[]), "");
    }

    #[test]
    fn shaping_prompt_embeds_block_and_format() {
        let p = shaping_prompt("revenue by region", &candidates());
        assert!(p.contains("'revenue by region'"));
        assert!(p.contains("revenue (Total revenue): [region, day]"));
        assert!(p.contains("You may choose only a single metric."));
        assert!(p.ends_with("Filters: comma-separated valid SQL filter expressions using your chosen columns"));
    }
}
