//! Keyword classification of the free-text "topics covered" cell.
//!
//! Matching is plain substring containment on the lower-cased text, so short
//! keywords also fire inside longer words ("sql" in "mysql", "js" in "json").
//! Keep keyword lists in mind when adding a tag.

/// Checkable topics on the eval form, declared in checkbox order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicTag {
    Agile,
    Ajax,
    Api,
    Bootstrap,
    Vba,
    Callbacks,
    Classes,
    CommandLine,
    Css,
    DevelopmentWorkflow,
    Excel,
    Es6,
    Firebase,
    Git,
    Handlebars,
    Heroku,
    Html,
    Javascript,
    Jquery,
    JsTimers,
    LocalStorage,
    Mongodb,
    Mysql,
    Express,
    Node,
    Pandas,
    Promises,
    Pseudocode,
    Python,
    React,
    Sequelize,
    Tdd,
}

impl TopicTag {
    pub const ALL: [TopicTag; 32] = [
        TopicTag::Agile,
        TopicTag::Ajax,
        TopicTag::Api,
        TopicTag::Bootstrap,
        TopicTag::Vba,
        TopicTag::Callbacks,
        TopicTag::Classes,
        TopicTag::CommandLine,
        TopicTag::Css,
        TopicTag::DevelopmentWorkflow,
        TopicTag::Excel,
        TopicTag::Es6,
        TopicTag::Firebase,
        TopicTag::Git,
        TopicTag::Handlebars,
        TopicTag::Heroku,
        TopicTag::Html,
        TopicTag::Javascript,
        TopicTag::Jquery,
        TopicTag::JsTimers,
        TopicTag::LocalStorage,
        TopicTag::Mongodb,
        TopicTag::Mysql,
        TopicTag::Express,
        TopicTag::Node,
        TopicTag::Pandas,
        TopicTag::Promises,
        TopicTag::Pseudocode,
        TopicTag::Python,
        TopicTag::React,
        TopicTag::Sequelize,
        TopicTag::Tdd,
    ];

    /// Stable identifier, used to name the tag's selector (`topic-<slug>`).
    pub fn slug(self) -> &'static str {
        match self {
            TopicTag::Agile => "agile",
            TopicTag::Ajax => "ajax",
            TopicTag::Api => "api",
            TopicTag::Bootstrap => "bootstrap",
            TopicTag::Vba => "vba",
            TopicTag::Callbacks => "callbacks",
            TopicTag::Classes => "classes",
            TopicTag::CommandLine => "command-line",
            TopicTag::Css => "css",
            TopicTag::DevelopmentWorkflow => "development-workflow",
            TopicTag::Excel => "excel",
            TopicTag::Es6 => "es6",
            TopicTag::Firebase => "firebase",
            TopicTag::Git => "git",
            TopicTag::Handlebars => "handlebars",
            TopicTag::Heroku => "heroku",
            TopicTag::Html => "html",
            TopicTag::Javascript => "javascript",
            TopicTag::Jquery => "jquery",
            TopicTag::JsTimers => "js-timers",
            TopicTag::LocalStorage => "local-storage",
            TopicTag::Mongodb => "mongodb",
            TopicTag::Mysql => "mysql",
            TopicTag::Express => "express",
            TopicTag::Node => "node",
            TopicTag::Pandas => "pandas",
            TopicTag::Promises => "promises",
            TopicTag::Pseudocode => "pseudocode",
            TopicTag::Python => "python",
            TopicTag::React => "react",
            TopicTag::Sequelize => "sequelize",
            TopicTag::Tdd => "tdd",
        }
    }

    /// Checkbox caption on the form.
    pub fn label(self) -> &'static str {
        match self {
            TopicTag::Agile => "Agile Methodology",
            TopicTag::Ajax => "AJAX",
            TopicTag::Api => "APIs",
            TopicTag::Bootstrap => "Bootstrap",
            TopicTag::Vba => "VBA",
            TopicTag::Callbacks => "Callbacks",
            TopicTag::Classes => "Classes",
            TopicTag::CommandLine => "Command Line",
            TopicTag::Css => "CSS",
            TopicTag::DevelopmentWorkflow => "Development Workflow",
            TopicTag::Excel => "Excel",
            TopicTag::Es6 => "ES6",
            TopicTag::Firebase => "Firebase",
            TopicTag::Git => "Git",
            TopicTag::Handlebars => "Handlebars",
            TopicTag::Heroku => "Heroku",
            TopicTag::Html => "HTML",
            TopicTag::Javascript => "JavaScript",
            TopicTag::Jquery => "jQuery",
            TopicTag::JsTimers => "JS Timers",
            TopicTag::LocalStorage => "Local Storage",
            TopicTag::Mongodb => "MongoDB",
            TopicTag::Mysql => "MySQL",
            TopicTag::Express => "Express",
            TopicTag::Node => "Node",
            TopicTag::Pandas => "Pandas",
            TopicTag::Promises => "Promises",
            TopicTag::Pseudocode => "Pseudocoding",
            TopicTag::Python => "Python",
            TopicTag::React => "React",
            TopicTag::Sequelize => "Sequelize",
            TopicTag::Tdd => "Test Driven Development",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            TopicTag::Agile => &["agile", "scrum"],
            TopicTag::Ajax => &["ajax"],
            TopicTag::Api => &["api"],
            TopicTag::Bootstrap => &["bootstrap"],
            TopicTag::Vba => &["vba"],
            TopicTag::Callbacks => &["callback"],
            TopicTag::Classes => &["class"],
            TopicTag::CommandLine => &["command line", "commandline", "terminal"],
            TopicTag::Css => &["css"],
            TopicTag::DevelopmentWorkflow => &["development workflow", "dev workflow"],
            TopicTag::Excel => &["excel"],
            TopicTag::Es6 => &["es6", "es2015", "esnext"],
            TopicTag::Firebase => &["firebase"],
            TopicTag::Git => &["git"],
            TopicTag::Handlebars => &["handlebars"],
            TopicTag::Heroku => &["heroku"],
            TopicTag::Html => &["html"],
            TopicTag::Javascript => &["javascript", "js"],
            TopicTag::Jquery => &["jquery"],
            TopicTag::JsTimers => &["timer", "setinterval"],
            TopicTag::LocalStorage => &["localstorage", "local storage"],
            TopicTag::Mongodb => &["mongodb", "mongo"],
            TopicTag::Mysql => &["mysql", "sql"],
            TopicTag::Express => &["express"],
            TopicTag::Node => &["node"],
            TopicTag::Pandas => &["pandas"],
            TopicTag::Promises => &["promise"],
            TopicTag::Pseudocode => &["pseudocode", "pseudo code"],
            TopicTag::Python => &["python"],
            TopicTag::React => &["react"],
            TopicTag::Sequelize => &["sequelize"],
            TopicTag::Tdd => &[
                "tdd",
                "test driven development",
                "test-driven development",
            ],
        }
    }
}

/// Lower-cased, trimmed topic text; empty when the cell is absent.
pub fn normalize(raw: Option<&str>) -> String {
    raw.map(|text| text.trim().to_lowercase()).unwrap_or_default()
}

/// Every tag whose keywords occur in `raw`, in checkbox order.
pub fn classify(raw: Option<&str>) -> Vec<TopicTag> {
    let text = normalize(raw);
    if text.is_empty() {
        return Vec::new();
    }

    TopicTag::ALL
        .iter()
        .copied()
        .filter(|tag| tag.keywords().iter().any(|keyword| text.contains(keyword)))
        .collect()
}
