// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Herald Sandbox
// A model/view pair wired through the Events capability.

use anyhow::Result;
use herald_core::{Callback, Events, EventsConfig, Evented, StopListening};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Evented)]
struct TodoModel {
    title: Mutex<String>,
    events: Events,
}

impl TodoModel {
    fn new(config: &EventsConfig) -> Self {
        Self {
            title: Mutex::new(String::new()),
            events: Events::with_config(config.clone().with_label("todo-model")),
        }
    }

    fn set_title(&self, title: &str) -> Result<()> {
        let previous = {
            let mut current = self.title.lock().map_err(|e| anyhow::anyhow!("{e}"))?;
            std::mem::replace(&mut *current, title.to_string())
        };
        self.trigger("change:title", &[json!(title), json!(previous)])?;
        Ok(())
    }
}

#[derive(Evented)]
struct TodoView {
    rendered: Arc<Mutex<Vec<String>>>,
    events: Events,
}

impl TodoView {
    fn new(config: &EventsConfig) -> Self {
        Self {
            rendered: Arc::new(Mutex::new(Vec::new())),
            events: Events::with_config(config.clone().with_label("todo-view")),
        }
    }

    fn attach(&self, model: &TodoModel) {
        let rendered = self.rendered.clone();
        self.listen_to(
            model,
            "change:title",
            Callback::new(move |_, args| {
                let title = args.first().and_then(Value::as_str).unwrap_or_default();
                let line = format!("<h1>{title}</h1>");
                log::info!("View rendered {line}");
                rendered
                    .lock()
                    .map_err(|e| anyhow::anyhow!("{e}"))?
                    .push(line);
                Ok(())
            }),
        );
        self.listen_to_once(
            model,
            "saved",
            Callback::new(|_, _| {
                log::info!("View flashed 'saved' once.");
                Ok(())
            }),
        );
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EventsConfig::load(path)?,
        None => EventsConfig::default(),
    };

    let model = TodoModel::new(&config);
    let view = TodoView::new(&config);
    view.attach(&model);

    model.once(
        "saved",
        Callback::new(|_, _| {
            log::info!("Model persisted.");
            Ok(())
        }),
    );

    model.set_title("Write the report")?;
    model.set_title("Write the quarterly report")?;
    model.trigger("saved", &[])?;
    model.trigger("saved", &[])?;

    view.stop_listening(StopListening::SourceAndEvent(model.events(), "change:title"));
    model.set_title("Not rendered")?;

    let rendered = view.rendered.lock().map_err(|e| anyhow::anyhow!("{e}"))?;
    log::info!("View rendered {} title(s).", rendered.len());
    Ok(())
}
