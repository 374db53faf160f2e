use crate::catalog::Catalog;
use crate::error::Result;
use crate::progression::Progression;

/// Playable output assembled from a progression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub text: String,
    /// Number of level sections written
    pub levels: usize,
}

/// Turns an ordered progression into a playable bundle
pub trait Renderer {
    fn render(&self, catalog: &Catalog, progression: &Progression) -> Result<Bundle>;
}

/// Sends a bundle somewhere and returns where it can be fetched
pub trait Publisher {
    fn publish(&self, bundle: &Bundle) -> Result<String>;
}

/// Engine source followed by one numbered `message Level` section per laid-out level
///
/// Marker levels without a layout are skipped and do not take a number.
#[derive(Debug, Clone)]
pub struct ScriptRenderer {
    engine_source: String,
}

impl ScriptRenderer {
    pub fn new(engine_source: impl Into<String>) -> Self {
        ScriptRenderer {
            engine_source: engine_source.into(),
        }
    }
}

impl ScriptRenderer {
    /// One standalone bundle per laid-out level: engine source plus that layout
    pub fn render_each(&self, catalog: &Catalog, progression: &Progression) -> Result<Vec<Bundle>> {
        let mut bundles = Vec::new();
        for id in progression {
            let level = catalog.level(id)?;
            if level.layout.is_empty() {
                continue;
            }
            bundles.push(Bundle {
                text: format!("{}{}", self.engine_source, level.layout_text()),
                levels: 1,
            });
        }
        Ok(bundles)
    }
}

impl Renderer for ScriptRenderer {
    fn render(&self, catalog: &Catalog, progression: &Progression) -> Result<Bundle> {
        let mut text = self.engine_source.clone();
        let mut levels = 0;

        for id in progression {
            let level = catalog.level(id)?;
            if level.layout.is_empty() {
                continue;
            }
            levels += 1;
            text.push_str(&format!("message Level {}\n\n{}\n\n", levels, level.layout_text()));
        }

        log::debug!("Rendered {} level sections", levels);
        Ok(Bundle { text, levels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Level;
    use crate::error::Error;
    use crate::test_support::ids;
    use std::cell::RefCell;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Level::new("Intro", ["push"], Vec::<String>::new()).with_layout("#p!\n###"),
            Level::new("Next", Vec::<String>::new(), ["push"]).with_layout("p.!"),
            Level::new("Done", Vec::<String>::new(), ["push"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_script_renderer_numbers_laid_out_levels() {
        let bundle = ScriptRenderer::new("ENGINE\n")
            .render(&catalog(), &ids(&["Intro", "Done", "Next"]))
            .unwrap();

        assert_eq!(bundle.levels, 2);
        assert_eq!(
            bundle.text,
            "ENGINE\nmessage Level 1\n\n#p!\n###\n\nmessage Level 2\n\np.!\n\n"
        );
    }

    #[test]
    fn test_render_each_level_alone() {
        let bundles = ScriptRenderer::new("ENGINE\n")
            .render_each(&catalog(), &ids(&["Intro", "Done", "Next"]))
            .unwrap();

        let texts: Vec<&str> = bundles.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["ENGINE\n#p!\n###", "ENGINE\np.!"]);
        assert!(bundles.iter().all(|b| b.levels == 1));
    }

    #[test]
    fn test_render_unknown_level() {
        let result = ScriptRenderer::new("").render(&catalog(), &ids(&["Missing"]));
        assert!(matches!(result, Err(Error::UnknownLevel(_))));
    }

    struct RecordingPublisher {
        sent: RefCell<Vec<String>>,
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, bundle: &Bundle) -> Result<String> {
            if bundle.levels == 0 {
                return Err(Error::Publish("nothing to publish".to_string()));
            }
            self.sent.borrow_mut().push(bundle.text.clone());
            Ok(format!("memory://{}", self.sent.borrow().len()))
        }
    }

    #[test]
    fn test_publisher_interface() {
        let publisher = RecordingPublisher {
            sent: RefCell::new(Vec::new()),
        };
        let bundle = ScriptRenderer::new("")
            .render(&catalog(), &ids(&["Intro"]))
            .unwrap();

        assert_eq!(publisher.publish(&bundle).unwrap(), "memory://1");
        assert!(matches!(
            publisher.publish(&Bundle { text: String::new(), levels: 0 }),
            Err(Error::Publish(_))
        ));
    }
}
