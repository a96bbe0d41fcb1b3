use crate::core::dataset::{DatasetColumn, DonationTable};
use crate::core::histogram::Histogram;
use crate::domain::model::PredictedDonationCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    ExploratoryAnalysis,
    MachineLearningModeling,
    NeighbourhoodMapping,
    DataCollection,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::ExploratoryAnalysis,
        Page::MachineLearningModeling,
        Page::NeighbourhoodMapping,
        Page::DataCollection,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::ExploratoryAnalysis => "Exploratory Data Analysis",
            Page::MachineLearningModeling => "Machine Learning Modeling",
            Page::NeighbourhoodMapping => "Neighbourhood Mapping",
            Page::DataCollection => "Data Collection",
        }
    }

    pub fn is_implemented(self) -> bool {
        !matches!(self, Page::NeighbourhoodMapping)
    }
}

const ABSTRACT: &str = "\
The Edmonton Food Drive Project aimed to address food insecurity in the local
community by collecting non-perishable food and monetary donations for local
food banks. It brought together community members, volunteers, and businesses
to support those in need. Key lessons learned from the project included the
importance of effective community engagement, efficient logistics planning for
smooth collection and distribution, clear communication for coordinating
volunteers, and the power of raising awareness through social media and
outreach to increase participation and make a meaningful impact.";

const WHAT_IT_DOES: &str = "\
The Edmonton Food Drive Project involved analyzing data related to food
donations and distribution patterns. Using this data, we developed predictive
models to optimize the donation process, identify trends in donation volumes,
and predict future needs. By examining key factors such as donor behavior,
seasonal trends, and donation volumes, we aimed to provide actionable insights
that could improve the efficiency of future food drives. The project leveraged
machine learning techniques to build models that could assist in better
planning and resource allocation for food banks.";

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.chars().count()))
}

pub fn navigation(app_title: &str) -> String {
    let mut out = heading(app_title);
    for (i, page) in Page::ALL.iter().enumerate() {
        let marker = if page.is_implemented() { "" } else { " (coming soon)" };
        out.push_str(&format!("  {}. {}{}\n", i + 1, page.title(), marker));
    }
    out
}

pub fn render_dashboard() -> String {
    format!(
        "{}\n💡 Abstract:\n{}\n\n👨🏻‍💻 What our Project Does?\n{}\n",
        heading(Page::Dashboard.title()),
        ABSTRACT,
        WHAT_IT_DOES
    )
}

pub fn render_exploration(table: &DonationTable, bins: usize, bar_width: usize) -> String {
    let mut out = heading(Page::ExploratoryAnalysis.title());
    out.push_str(&format!("Records: {}\n", table.len()));
    if let Some((first, last)) = table.date_range() {
        out.push_str(&format!(
            "Collected: {} to {}\n",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        ));
    }
    for column in DatasetColumn::EXPLORED {
        let hist = Histogram::build(column.label(), &table.column(column), bins);
        out.push('\n');
        out.push_str(&hist.render_text(bar_width));
    }
    out
}

pub fn render_prediction(count: &PredictedDonationCount) -> String {
    format!("Predicted Donation Bags: {}", count)
}

pub fn render_mapping() -> String {
    format!(
        "{}Neighbourhood mapping is not available yet.\n",
        heading(Page::NeighbourhoodMapping.title())
    )
}

pub fn render_collection(form_url: &str) -> String {
    format!(
        "{}Please fill out the Google form to contribute to our Food Drive!\nFill out the form: {}\n",
        heading(Page::DataCollection.title()),
        form_url
    )
}
