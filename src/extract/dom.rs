use super::ContentNode;
use wasm_bindgen::JsCast;

impl ContentNode {
    /// Snapshot of a live DOM subtree.
    pub fn from_dom(node: &web_sys::Node) -> Self {
        match node.node_type() {
            web_sys::Node::TEXT_NODE => ContentNode::Text(node.text_content().unwrap_or_default()),
            web_sys::Node::ELEMENT_NODE => {
                let tag = node
                    .dyn_ref::<web_sys::Element>()
                    .map(|el| el.tag_name())
                    .unwrap_or_else(|| node.node_name());

                let list = node.child_nodes();
                let children = (0..list.length())
                    .filter_map(|i| list.item(i))
                    .map(|child| ContentNode::from_dom(&child))
                    .collect();

                ContentNode::element(&tag, children)
            }
            _ => ContentNode::Other,
        }
    }
}
