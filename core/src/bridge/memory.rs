use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{BridgeMessage, EmbedContent, EmbedHost, Envelope, Generation, PlayerCommand};
use crate::error::BridgeError;

#[derive(Default)]
struct State {
    loads: Vec<EmbedContent>,
    injected: Vec<(Generation, PlayerCommand)>,
    unloaded: Vec<Generation>,
    current: Option<Generation>,
    inbox: VecDeque<Envelope>,
    fail_loads: bool,
}

/// In-process host that records what the bridge does and lets the caller
/// play the part of the page.
///
/// Clones share state, so a test can keep one handle while the bridge owns
/// another.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Rc<RefCell<State>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `load` fail with a transport error
    pub fn fail_loads(&self, fail: bool) {
        self.state.borrow_mut().fail_loads = fail;
    }

    /// Queue a raw payload as if page `generation` had posted it
    pub fn push_raw(&self, generation: Generation, payload: impl Into<String>) {
        self.state.borrow_mut().inbox.push_back(Envelope {
            generation,
            payload: payload.into(),
        });
    }

    /// Queue `message` in wire format as if page `generation` had posted it
    pub fn emit(&self, generation: Generation, message: &BridgeMessage) {
        self.push_raw(generation, message.encode());
    }

    /// Generation of the page currently shown, if any
    pub fn current(&self) -> Option<Generation> {
        self.state.borrow().current
    }

    pub fn loads(&self) -> Vec<EmbedContent> {
        self.state.borrow().loads.clone()
    }

    pub fn injected(&self) -> Vec<(Generation, PlayerCommand)> {
        self.state.borrow().injected.clone()
    }

    pub fn unloaded(&self) -> Vec<Generation> {
        self.state.borrow().unloaded.clone()
    }
}

impl EmbedHost for MemoryHost {
    fn load(&mut self, content: &EmbedContent) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        if state.fail_loads {
            return Err(BridgeError::Transport("load refused".to_string()));
        }
        state.current = Some(content.generation);
        state.loads.push(content.clone());
        Ok(())
    }

    fn inject(&mut self, generation: Generation, command: PlayerCommand) -> Result<(), BridgeError> {
        self.state.borrow_mut().injected.push((generation, command));
        Ok(())
    }

    fn unload(&mut self, generation: Generation) {
        let mut state = self.state.borrow_mut();
        if state.current == Some(generation) {
            state.current = None;
        }
        state.unloaded.push(generation);
    }

    fn try_recv(&mut self) -> Option<Envelope> {
        self.state.borrow_mut().inbox.pop_front()
    }
}
