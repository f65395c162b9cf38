//! Single-page chat UI served at `/`

pub const CHAT_PAGE: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>ABT Local Chat</title>
    <style>
      :root { color-scheme: light dark; font-family: system-ui, -apple-system, sans-serif; }
      body { margin: 0; padding: 2rem; background: #0f172a; color: #e2e8f0; }
      h1 { margin-top: 0; }
      .layout { display: grid; grid-template-columns: 260px 1fr; gap: 1.5rem; }
      .panel { background: #111827; border: 1px solid #1f2937; border-radius: 12px; padding: 1rem; }
      .messages { height: 50vh; overflow-y: auto; padding-right: 0.5rem; }
      .message { margin-bottom: 0.75rem; padding: 0.75rem; border-radius: 8px; background: rgba(148, 163, 184, 0.1); }
      .message.user { background: rgba(59, 130, 246, 0.2); }
      .meta { font-size: 0.75rem; color: #94a3b8; margin-bottom: 0.25rem; }
      label { display: block; font-size: 0.85rem; margin-bottom: 0.25rem; }
      select, textarea, button {
        width: 100%; border-radius: 8px; border: 1px solid #1f2937; padding: 0.65rem;
        background: #0b1120; color: inherit; font-size: 0.9rem;
      }
      textarea { min-height: 120px; resize: vertical; }
      button { margin-top: 0.75rem; cursor: pointer; background: #2563eb; border: none; }
      button:disabled { opacity: 0.6; cursor: not-allowed; }
      .status { margin-top: 0.5rem; font-size: 0.85rem; color: #fca5a5; }
    </style>
  </head>
  <body>
    <h1>ABT Local Chat</h1>
    <div class="layout">
      <div class="panel">
        <label for="agent">Agent</label>
        <select id="agent"></select>
        <p class="meta" id="agent-meta"></p>
      </div>
      <div class="panel">
        <div class="messages" id="messages"></div>
        <label for="prompt">Message</label>
        <textarea id="prompt" placeholder="Ask the agent something..."></textarea>
        <button id="send">Send</button>
        <div class="status" id="status"></div>
      </div>
    </div>
    <script>
      const agentSelect = document.getElementById("agent");
      const agentMeta = document.getElementById("agent-meta");
      const messagesEl = document.getElementById("messages");
      const promptEl = document.getElementById("prompt");
      const sendBtn = document.getElementById("send");
      const statusEl = document.getElementById("status");
      const history = [];

      function renderMessages() {
        messagesEl.innerHTML = "";
        for (const message of history) {
          const div = document.createElement("div");
          div.className = `message ${message.role}`;
          const meta = document.createElement("div");
          meta.className = "meta";
          meta.textContent = message.role.toUpperCase();
          const content = document.createElement("div");
          content.textContent = message.content;
          div.append(meta, content);
          messagesEl.appendChild(div);
        }
        messagesEl.scrollTop = messagesEl.scrollHeight;
      }

      function setStatus(text) {
        statusEl.textContent = text || "";
      }

      function updateMeta() {
        const selected = agentSelect.selectedOptions[0];
        agentMeta.textContent = selected
          ? `Provider: ${selected.dataset.provider} · Model: ${selected.dataset.model}`
          : "";
      }

      async function loadAgents() {
        const response = await fetch("/api/agents");
        const data = await response.json();
        agentSelect.innerHTML = "";
        for (const agent of data.agents) {
          const opt = document.createElement("option");
          opt.value = agent.name;
          opt.textContent = agent.name;
          opt.dataset.provider = agent.model_provider || "unknown";
          opt.dataset.model = agent.model || "default";
          agentSelect.appendChild(opt);
        }
        updateMeta();
      }

      async function sendMessage() {
        const agent = agentSelect.value;
        const message = promptEl.value.trim();
        if (!agent || !message) {
          return;
        }
        sendBtn.disabled = true;
        setStatus("");
        const prior = history.slice();
        history.push({ role: "user", content: message });
        renderMessages();
        promptEl.value = "";
        try {
          const response = await fetch("/api/chat", {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify({ agent, message, history: prior }),
          });
          const data = await response.json();
          if (!response.ok) {
            throw new Error(data.error || "Request failed");
          }
          history.push({ role: "assistant", content: data.reply });
          renderMessages();
        } catch (err) {
          setStatus(err.message);
        } finally {
          sendBtn.disabled = false;
        }
      }

      agentSelect.addEventListener("change", updateMeta);
      sendBtn.addEventListener("click", sendMessage);
      promptEl.addEventListener("keydown", (event) => {
        if (event.key === "Enter" && (event.metaKey || event.ctrlKey)) {
          sendMessage();
        }
      });

      loadAgents().catch((err) => setStatus(err.message));
    </script>
  </body>
</html>
"#;
