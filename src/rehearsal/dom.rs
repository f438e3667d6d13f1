use crate::driver::Locator;

/// What a node does when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login,
    Follow(String),
    OpenSlider,
    SaveSettings,
    StartDrill,
    Check,
    RecordScore,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
    pub value: String,
    pub displayed: bool,
    pub enabled: bool,
    pub action: Option<Action>,
    children: Vec<usize>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            displayed: true,
            enabled: true,
            ..Self::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn on_click(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Locator::Selector { tag, classes } => {
                tag.as_ref().map_or(true, |t| *t == self.tag)
                    && classes.iter().all(|c| self.classes.contains(c))
            }
            Locator::ContainsText { tag, text } => {
                (tag == "*" || *tag == self.tag) && self.text.contains(text.as_str())
            }
        }
    }
}

/// A page as a flat arena of nodes. Index 0 is the body; nodes are only
/// ever appended, so indices stay valid for the page's lifetime.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("body")],
        }
    }

    pub const BODY: usize = 0;

    pub fn append(&mut self, parent: usize, node: Node) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(idx);
        idx
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn node_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.nodes.get_mut(idx)
    }

    /// Matches strictly below `root`, in document order.
    pub fn query(&self, root: usize, locator: &Locator) -> Vec<usize> {
        let mut found = Vec::new();
        self.collect(root, locator, &mut found);
        found
    }

    fn collect(&self, idx: usize, locator: &Locator, found: &mut Vec<usize>) {
        for &child in &self.nodes[idx].children {
            if self.nodes[child].matches(locator) {
                found.push(child);
            }
            self.collect(child, locator, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_document_order_and_scoped() {
        let mut dom = Dom::new();
        let table = dom.append(Dom::BODY, Node::new("table").class("table table--fat"));
        let row = dom.append(table, Node::new("tr"));
        let a = dom.append(row, Node::new("td").text("1. dog"));
        let b = dom.append(row, Node::new("td").text("1. perro"));
        dom.append(Dom::BODY, Node::new("td").text("outside"));

        assert_eq!(dom.query(table, &Locator::css("td")), vec![a, b]);
        assert_eq!(dom.query(Dom::BODY, &Locator::css("td")).len(), 3);
        assert_eq!(
            dom.query(Dom::BODY, &Locator::css("table.table.table--fat")),
            vec![table]
        );
    }

    #[test]
    fn contains_text_respects_tag() {
        let mut dom = Dom::new();
        let label = dom.append(Dom::BODY, Node::new("label").text("Avg Score: 90%"));
        dom.append(Dom::BODY, Node::new("span").text("Avg Score"));

        assert_eq!(
            dom.query(Dom::BODY, &Locator::containing("label", "Avg Score")),
            vec![label]
        );
        assert_eq!(
            dom.query(Dom::BODY, &Locator::containing("*", "Avg Score")).len(),
            2
        );
    }
}
